use super::*;

/// One manual edit, parsed from `indent:<id,..>`, `outdent:<id,..>`,
/// `exclude:<id,..>`, `include:<id,..>`, or `reset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Indent(Vec<String>),
    Outdent(Vec<String>),
    Exclude(Vec<String>),
    Include(Vec<String>),
    Reset,
}

impl FromStr for EditOp {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("reset") {
            return Ok(EditOp::Reset);
        }

        let Some((name, ids)) = raw.split_once(':') else {
            bail!("edit operation `{raw}` must look like `<op>:<id,..>` or `reset`");
        };
        let ids: Vec<String> = ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            bail!("edit operation `{raw}` names no header ids");
        }

        match name.trim().to_ascii_lowercase().as_str() {
            "indent" => Ok(EditOp::Indent(ids)),
            "outdent" => Ok(EditOp::Outdent(ids)),
            "exclude" => Ok(EditOp::Exclude(ids)),
            "include" => Ok(EditOp::Include(ids)),
            other => bail!("unknown edit operation `{other}`"),
        }
    }
}
