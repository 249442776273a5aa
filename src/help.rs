use crate::descriptor::Descriptor;

/// One help line per descriptor, in decoding order.
#[cold]
pub(crate) fn render_help(descs: &[Descriptor]) -> String {
    let mut out = String::with_capacity(descs.iter().map(|d| d.help.len() + 1).sum());
    for (i, desc) in descs.iter().enumerate() {
        if i != 0 {
            out.push('\n');
        }
        out.push_str(desc.help);
    }
    out
}
