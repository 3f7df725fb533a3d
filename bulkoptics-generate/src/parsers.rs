use std::path::Path;

use bulkoptics_data::EfficiencyTable;

/// Optical parameters read from the `# key = value` header lines.
#[derive(Debug, Default)]
struct Header {
    refractive_index: Option<(f64, f64)>,
    wavelength: Option<f64>,
    medium_index: Option<f64>,
}

pub fn parse_table_file(path: &Path) -> Result<EfficiencyTable, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    parse_table(&content).map_err(|e| format!("{}: {e}", path.display()))
}

/// Parses one exported efficiency table.
///
/// Rows are `diameter qext qsca qabs`; they may appear in any order but
/// diameters must be unique.
pub fn parse_table(content: &str) -> Result<EfficiencyTable, String> {
    let mut header = Header::default();
    let mut rows: Vec<[f64; 4]> = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            parse_header_line(comment, &mut header)
                .map_err(|e| format!("line {}: {e}", lineno + 1))?;
            continue;
        }
        let values: Vec<f64> = line
            .split_whitespace()
            .map(|w| w.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("line {}: {e}", lineno + 1))?;
        if values.len() != 4 {
            return Err(format!(
                "line {}: expected 4 columns, found {}",
                lineno + 1,
                values.len()
            ));
        }
        rows.push([values[0], values[1], values[2], values[3]]);
    }

    let (m_re, m_im) = header.refractive_index.ok_or("missing `# m = <re> <im>` header")?;
    let wavelength = header.wavelength.ok_or("missing `# wavelength = <nm>` header")?;
    let medium_index = header.medium_index.ok_or("missing `# medium = <n>` header")?;
    if rows.len() < 2 {
        return Err(format!("need at least 2 rows, found {}", rows.len()));
    }

    rows.sort_by(|a, b| a[0].total_cmp(&b[0]));
    if let Some(w) = rows.windows(2).find(|w| w[0][0] >= w[1][0]) {
        return Err(format!("duplicate diameter {}", w[1][0]));
    }
    if let Some(r) = rows.iter().find(|r| !(r[0] > 0.0) || r.iter().any(|v| !v.is_finite())) {
        return Err(format!("invalid row {r:?}"));
    }

    Ok(EfficiencyTable {
        refractive_index_re: m_re,
        refractive_index_im: m_im,
        wavelength,
        medium_index,
        diameter: rows.iter().map(|r| r[0]).collect(),
        qext: rows.iter().map(|r| r[1]).collect(),
        qsca: rows.iter().map(|r| r[2]).collect(),
        qabs: rows.iter().map(|r| r[3]).collect(),
    })
}

fn parse_header_line(comment: &str, header: &mut Header) -> Result<(), String> {
    // Plain comments have no `=`.
    let Some((key, value)) = comment.split_once('=') else {
        return Ok(());
    };
    let numbers: Vec<f64> = value
        .split_whitespace()
        .map(|w| w.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("bad value for `{}`: {e}", key.trim()))?;

    match (key.trim(), numbers.as_slice()) {
        ("m", [re, im]) => header.refractive_index = Some((*re, *im)),
        ("wavelength", [wl]) => header.wavelength = Some(*wl),
        ("medium", [n]) => header.medium_index = Some(*n),
        ("m" | "wavelength" | "medium", _) => {
            return Err(format!("wrong number of values for `{}`", key.trim()));
        }
        _ => {}
    }
    Ok(())
}
