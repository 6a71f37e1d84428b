use super::{
    params::{parse_image_params, parse_int, parse_params, udg_addresses, Chars, Cursor, ParamSpec},
    MacroError, MacroExpander,
};
use crate::{
    config::{FONT_IMAGE_PATH, SCREENSHOT_IMAGE_PATH, UDG_IMAGE_PATH},
    graphics::{
        flip_grid,
        frame::DEFAULT_DELAY,
        rotate_grid,
        screen::{default_font_text, font_tiles, screenshot},
        tile::to_rows,
        Frame, MaskType, Tile, TileGrid,
    },
    snapshot::Snapshot,
};

const UDG: ParamSpec<'static> = ParamSpec::named(
    &["addr", "attr", "scale", "step", "inc", "flip", "rotate", "mask"],
    &[Some(56), Some(4), Some(1), Some(0), Some(0), Some(0), Some(1)],
);

const UDGARRAY: ParamSpec<'static> = ParamSpec::positional(
    &["width", "attr", "scale", "step", "inc", "flip", "rotate", "mask"],
    &[Some(56), Some(2), Some(1), Some(0), Some(0), Some(0), Some(1)],
);

const SCR: ParamSpec<'static> = ParamSpec::positional(
    &["scale", "x", "y", "w", "h", "df", "af"],
    &[Some(1), Some(0), Some(0), Some(32), Some(24), Some(16384), Some(22528)],
);

/// Eight bytes `step` apart from `address`, each plus `inc` (mod 256).
fn tile_data(snapshot: &Snapshot, address: u32, step: u32, inc: u32) -> [u8; 8] {
    let mut data = to_rows(&snapshot.read_strided(address, step, 8));
    for byte in data.iter_mut() {
        *byte = byte.wrapping_add(inc as u8);
    }
    data
}

fn mask_type(value: u32) -> Result<MaskType, MacroError> {
    MaskType::try_from(value)
        .map_err(|value| MacroError::Parsing(format!("Invalid mask type: {}", value)))
}

impl MacroExpander<'_> {
    /// Image path for `fname` in the directory of `path_id`, falling back on
    /// `default` if `fname` is missing or blank.
    fn image_path_or(
        &self,
        fname: Option<String>,
        default: &str,
        path_id: &str,
    ) -> Result<String, MacroError> {
        let fname = fname.filter(|f| !f.is_empty()).unwrap_or_else(|| default.to_owned());
        self.resolver()
            .image_path(&fname, path_id)?
            .ok_or_else(|| MacroError::Parsing("Missing filename".to_owned()))
    }

    // #UDGaddr[,attr,scale,step,inc,flip,rotate,mask][:addr[,step]][{x,y,width,height}][(fname)]
    pub(super) fn expand_udg(
        &mut self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        let parsed = parse_image_params(text, index, &UDG, "")?;
        let params = &parsed.params;
        let (addr, attr, scale) = (params.int(0), params.int(1), params.int(2));
        let (step, inc) = (params.int(3), params.int(4));
        let (flip, rotate) = (params.int(5), params.int(6));
        let mut mask = mask_type(params.int(7))?;
        let (mut end, mut crop, mut fname) = (parsed.end, parsed.crop, parsed.fname.clone());

        let mut mask_source = None;
        if text[end..].starts_with(':') {
            let defaults = [Some(step)];
            let spec = ParamSpec::named(&["addr", "step"], &defaults);
            let mask_params = parse_image_params(text, end + 1, &spec, "")?;
            mask_source = Some((mask_params.params.int(0), mask_params.params.int(1)));
            (end, crop, fname) = (mask_params.end, mask_params.crop, mask_params.fname);
        }
        if mask_source.is_none() {
            mask = MaskType::None;
        }

        let default_name = format!("udg{}_{}x{}", addr, attr, scale);
        let image_path = self.image_path_or(fname, &default_name, UDG_IMAGE_PATH)?;
        if self.need_image(&image_path) {
            let snapshot = self.snapshot();
            let mut tile = Tile::new(attr as u8, tile_data(snapshot, addr, step, inc));
            if let Some((mask_addr, mask_step)) = mask_source {
                tile.mask = Some(to_rows(&snapshot.read_strided(mask_addr, mask_step, 8)));
            }
            tile.flip(flip);
            tile.rotate(rotate);
            let frame = Frame::new(vec![vec![tile]], scale, mask, crop)?;
            self.write_image(&image_path, &[frame])?;
        }
        Ok((end, self.resolver().img_element(cwd, &image_path)))
    }

    // #UDGARRAYwidth[,attr,scale,step,inc,flip,rotate,mask];addr[,attr,step,inc][:addr[,step]];...[{x,y,width,height}](fname[*frame])
    // #UDGARRAY*frame1[,delay1];frame2[,delay2];...(fname)
    pub(super) fn expand_udgarray(
        &mut self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        if text[index..].starts_with('*') {
            return self.expand_udgarray_frames(text, index, cwd);
        }

        let parsed = parse_image_params(text, index, &UDGARRAY, "")?;
        let params = &parsed.params;
        let width = params.int(0);
        if width == 0 {
            return Err(MacroError::Parsing(format!(
                "Invalid width: #UDGARRAY{}",
                &text[index..parsed.end]
            )));
        }
        let (def_attr, scale, def_step, def_inc) =
            (params.int(1), params.int(2), params.int(3), params.int(4));
        let (flip, rotate) = (params.int(5), params.int(6));
        let mut mask = mask_type(params.int(7))?;
        let (mut end, mut crop, mut fname) = (parsed.end, parsed.crop, parsed.fname.clone());

        let mut grid: TileGrid = vec![vec![]];
        let mut has_masks = false;
        while text[end..].starts_with(';') {
            let defaults = [Some(def_attr), Some(def_step), Some(def_inc)];
            let spec = ParamSpec::positional(&["addr", "attr", "step", "inc"], &defaults).with_text(&[0]);
            let clause = parse_image_params(text, end + 1, &spec, "-x")?;
            let addresses = udg_addresses(clause.params.text(0), width)?;
            let (attr, step, inc) = (clause.params.int(1), clause.params.int(2), clause.params.int(3));
            (end, crop, fname) = (clause.end, clause.crop, clause.fname);

            let mut mask_addresses = vec![];
            let mut mask_step = step;
            if text[end..].starts_with(':') {
                let defaults = [Some(step)];
                let spec = ParamSpec::positional(&["addr", "step"], &defaults).with_text(&[0]);
                let mask_params = parse_image_params(text, end + 1, &spec, "-x")?;
                mask_addresses = udg_addresses(mask_params.params.text(0), width)?;
                mask_step = mask_params.params.int(1);
                (end, crop, fname) = (mask_params.end, mask_params.crop, mask_params.fname);
            }
            has_masks |= !mask_addresses.is_empty();

            let snapshot = self.context.snapshots.current();
            for (n, address) in addresses.iter().enumerate() {
                let mut tile = Tile::new(attr as u8, tile_data(snapshot, *address, step, inc));
                if let Some(mask_addr) = mask_addresses.get(n) {
                    tile.mask = Some(to_rows(&snapshot.read_strided(*mask_addr, mask_step, 8)));
                }
                match grid.last_mut() {
                    Some(row) if row.len() < width as usize => row.push(tile),
                    _ => grid.push(vec![tile]),
                }
            }
        }
        if !has_masks {
            mask = MaskType::None;
        }

        let fname = fname.filter(|f| !f.is_empty()).ok_or_else(|| {
            MacroError::Parsing(format!("Missing filename: #UDGARRAY{}", &text[index..end]))
        })?;
        let (fname, frame_id) = match fname.split_once('*') {
            Some((fname, "")) => (fname, fname),
            Some((fname, frame_id)) => (fname, frame_id),
            None => (fname.as_str(), ""),
        };
        if fname.is_empty() && frame_id.is_empty() {
            return Err(MacroError::Parsing(format!(
                "Missing filename or frame ID: #UDGARRAY{}",
                &text[index..end]
            )));
        }

        let resolver = self.resolver();
        let image_path = resolver.image_path(fname, UDG_IMAGE_PATH)?;
        let need_image = image_path.as_deref().is_some_and(|path| self.need_image(path));
        if !frame_id.is_empty() || need_image {
            flip_grid(&mut grid, flip);
            rotate_grid(&mut grid, rotate);
            let frame = Frame::new(grid, scale, mask, crop)?;
            if !frame_id.is_empty() {
                self.context.frames.insert(frame_id, frame.clone());
            }
            if let (true, Some(path)) = (need_image, &image_path) {
                self.write_image(path, &[frame])?;
            }
        }
        Ok((
            end,
            image_path
                .map(|path| resolver.img_element(cwd, &path))
                .unwrap_or_default(),
        ))
    }

    fn expand_udgarray_frames(
        &mut self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        let (end, frame_params, fname) = parse_params(text, index, Chars::Except(" ("))?;
        let fname = fname.filter(|f| !f.is_empty()).ok_or_else(|| {
            MacroError::Parsing(format!("Missing filename: #UDGARRAY{}", &text[index..end]))
        })?;
        let image_path = self.image_path_or(Some(fname), "", UDG_IMAGE_PATH)?;

        if self.need_image(&image_path) {
            let mut frames = vec![];
            let mut delay = DEFAULT_DELAY;
            for frame_param in frame_params[1..].split(';') {
                let frame_id = match frame_param.rsplit_once(',') {
                    Some((frame_id, delay_param)) => {
                        delay = parse_int(delay_param).ok_or_else(|| {
                            MacroError::Parsing(format!("Invalid delay parameter: \"{}\"", delay_param))
                        })?;
                        frame_id
                    }
                    None => frame_param,
                };
                if frame_id.is_empty() {
                    return Err(MacroError::Parsing(format!(
                        "Missing frame ID: #UDGARRAY{}",
                        &text[index..end]
                    )));
                }
                let frame = self.context.frames.get(frame_id).ok_or_else(|| {
                    MacroError::Parsing(format!("No such frame: \"{}\"", frame_id))
                })?;
                frames.push(frame.with_delay(delay));
            }
            self.write_image(&image_path, &frames)?;
        }
        Ok((end, self.resolver().img_element(cwd, &image_path)))
    }

    // #FONT[:(text)]addr[,chars,attr,scale][{x,y,width,height}][(fname)]
    pub(super) fn expand_font(
        &mut self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let message = if cursor.accept(':') {
            let message = cursor.read_text()?;
            if message.is_empty() {
                return Err(MacroError::Parsing(format!(
                    "Empty message: {}",
                    &text[index..cursor.position()]
                )));
            }
            message
        } else {
            default_font_text()
        };

        let defaults = [Some(message.chars().count() as u32), Some(56), Some(2)];
        let spec = ParamSpec::positional(&["addr", "chars", "attr", "scale"], &defaults);
        let parsed = parse_image_params(text, cursor.position(), &spec, "")?;
        let params = &parsed.params;
        let image_path = self.image_path_or(parsed.fname.clone(), "font", FONT_IMAGE_PATH)?;
        if self.need_image(&image_path) {
            let message: String = message.chars().take(params.int(1) as usize).collect();
            let tiles = font_tiles(self.snapshot(), params.int(0), params.int(2) as u8, &message);
            let frame = Frame::new(tiles, params.int(3), MaskType::None, parsed.crop)?;
            self.write_image(&image_path, &[frame])?;
        }
        Ok((parsed.end, self.resolver().img_element(cwd, &image_path)))
    }

    // #SCR[scale,x,y,w,h,df,af][{x,y,width,height}][(fname)]
    pub(super) fn expand_scr(
        &mut self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        let parsed = parse_image_params(text, index, &SCR, "")?;
        let params = &parsed.params;
        let image_path = self.image_path_or(parsed.fname.clone(), "scr", SCREENSHOT_IMAGE_PATH)?;
        if self.need_image(&image_path) {
            let tiles = screenshot(
                self.snapshot(),
                params.int(1),
                params.int(2),
                params.int(3),
                params.int(4),
                params.int(5),
                params.int(6),
            );
            let frame = Frame::new(tiles, params.int(0), MaskType::None, parsed.crop)?;
            self.write_image(&image_path, &[frame])?;
        }
        Ok((parsed.end, self.resolver().img_element(cwd, &image_path)))
    }
}
