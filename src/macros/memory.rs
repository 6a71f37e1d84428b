use super::{
    params::{parse_ints, Cursor, ParamSpec},
    MacroError, MacroExpander,
};
use crate::snapshot::Snapshot;

const POKES: ParamSpec<'static> =
    ParamSpec::positional(&["addr", "byte", "length", "step"], &[Some(1), Some(1)]);

impl MacroExpander<'_> {
    // #POKESaddr,byte[,length,step][;addr,byte[,length,step];...]
    pub(super) fn expand_pokes(&mut self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let mut end = index;
        loop {
            let (next, params) = parse_ints(text, end, &POKES)?;
            let (addr, byte, length, step) =
                (params.int(0), params.int(1) as u8, params.int(2), params.int(3));
            let snapshot = self.context.snapshots.current_mut();
            // Addresses repeat after 64K pokes whatever the step.
            for n in 0..length.min(Snapshot::SIZE as u32) {
                snapshot.poke(addr.wrapping_add(n.wrapping_mul(step)), byte);
            }
            end = next;
            if !text[end..].starts_with(';') {
                break;
            }
            end += 1;
        }
        Ok((end, String::new()))
    }

    // #PUSHS[name]
    pub(super) fn expand_pushs(&mut self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let name = cursor.read_while(|c| c.is_alphanumeric() || c == '_');
        self.context.snapshots.push(name);
        Ok((cursor.position(), String::new()))
    }

    // #POPS
    pub(super) fn expand_pops(&mut self, index: usize) -> Result<(usize, String), MacroError> {
        self.context.snapshots.pop()?;
        Ok((index, String::new()))
    }
}
