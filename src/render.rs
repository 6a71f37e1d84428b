use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use strum::IntoEnumIterator;

use crate::{
    config::{Config, ConfigError},
    disassembly::{Entry, EntryKind, EntryMap, Instruction},
    images::{FileInfo, ImageFormat, RasterEncoder},
    macros::{params::parse_int, Macro, MacroExpander},
    snapshot::Snapshot,
};

/// Address a memory image is loaded at when it is smaller than 64K.
const DEFAULT_ORG: u16 = 16384;

#[derive(Args, Debug)]
pub struct ExpandArgs {
    #[clap(help = "Raw memory image to read graphics and data from")]
    snapshot: PathBuf,
    #[clap(help = "Text file containing the macros to expand")]
    input: PathBuf,
    #[clap(long, value_parser = parse_address)]
    #[clap(help = "Load address of the memory image [default: 0 for 64K, else 16384]")]
    org: Option<u16>,
    #[clap(long, default_value = "")]
    #[clap(help = "Directory of the page being written, relative to the output root")]
    cwd: String,
    #[clap(short = 'O', long)]
    #[clap(help = "Write the expanded text here instead of stdout")]
    output: Option<PathBuf>,
    #[clap(short = 'd', long, default_value = ".")]
    #[clap(help = "Root of the output tree")]
    output_dir: PathBuf,
    #[clap(short = 'o', long)]
    #[clap(help = "Overwrite existing image files")]
    rebuild_images: bool,
    #[clap(long, default_value = "png")]
    #[clap(help = "Default image format: png or gif")]
    format: ImageFormat,
    #[clap(short = 'l', long)]
    #[clap(help = "Write register names in lower case")]
    lower: bool,
    #[clap(short = 'a', long)]
    #[clap(help = "Use instruction labels as link text")]
    asm_labels: bool,
    #[clap(long)]
    #[clap(help = "Treat the image macros as unsupported")]
    no_images: bool,
    #[clap(long = "path", value_name = "ID=DIR")]
    #[clap(help = "Set the location of a page or image directory")]
    paths: Vec<String>,
    #[clap(long = "entry", value_name = "ADDR[=LABEL]")]
    #[clap(help = "Declare a routine at ADDR for #R links")]
    entries: Vec<String>,
}

fn parse_address(text: &str) -> Result<u16, ConfigError> {
    parse_int(text)
        .and_then(|n| u16::try_from(n).ok())
        .ok_or_else(|| ConfigError::InvalidAddress(text.to_owned()))
}

fn parse_entry(spec: &str) -> Result<Entry> {
    let (addr, label) = match spec.split_once('=') {
        Some((addr, label)) => (addr, Some(label)),
        None => (spec, None),
    };
    let address = parse_address(addr)?;
    let mut instruction = Instruction::new(address);
    if let Some(label) = label.filter(|l| !l.is_empty()) {
        instruction = instruction.with_label(label);
    }
    Ok(Entry::new(address, EntryKind::Code).with_instructions(vec![instruction]))
}

impl ExpandArgs {
    fn config(&self) -> Result<Config> {
        let mut config = Config {
            default_image_format: self.format,
            replace_images: self.rebuild_images,
            lower_case: self.lower,
            asm_labels: self.asm_labels,
            images: !self.no_images,
            ..Default::default()
        };
        for spec in &self.paths {
            config.set_path(spec)?;
        }
        Ok(config)
    }
}

/// Expand the macros in a text file against a raw memory image.
#[tracing::instrument]
pub fn expand(args: &ExpandArgs) -> Result<()> {
    let bytes = fs::read(&args.snapshot)
        .with_context(|| format!("Unable to read {}", args.snapshot.display()))?;
    let org = args.org.unwrap_or(if bytes.len() == Snapshot::SIZE {
        0
    } else {
        DEFAULT_ORG
    });
    let config = args.config()?;

    let mut disassembly = EntryMap::new(Snapshot::from_bytes(org, &bytes));
    for spec in &args.entries {
        disassembly.add_entry(parse_entry(spec).with_context(|| "Invalid entry")?);
    }

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Unable to read {}", args.input.display()))?;
    let file_store = FileInfo::new(args.output_dir.clone(), config.replace_images);
    let mut expander = MacroExpander::new(
        &config,
        &disassembly,
        Box::new(file_store),
        Box::new(RasterEncoder::new()),
    );
    let html = expander
        .expand(&text, &args.cwd)
        .with_context(|| "Macro expansion failed")?;

    match &args.output {
        Some(path) => {
            fs::write(path, html).with_context(|| "Unable to write file")?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}

/// Print the name of every macro.
pub fn list_macros() -> Result<()> {
    for name in Macro::iter() {
        println!("#{}", name);
    }
    Ok(())
}
