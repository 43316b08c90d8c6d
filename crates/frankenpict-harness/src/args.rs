//! Parsers for command-line values.

use frankenpict_core::SeedRow;

use crate::error::{HarnessError, Result};

/// `1,3,3,4` -> `[1, 3, 3, 4]`. Signed so that negative counts are
/// rejected by the generator with a proper reason.
pub fn parse_counts(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(|cell| {
            let cell = cell.trim();
            cell.parse::<i64>()
                .map_err(|e| HarnessError::parse(format!("value count '{cell}': {e}")))
        })
        .collect()
}

/// Decimal or `0x` hex, `_` separators allowed.
pub fn parse_seed(raw: &str) -> Result<u64> {
    let s = raw.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(&hex.replace('_', ""), 16)
    } else {
        s.replace('_', "").parse::<u64>()
    };
    parsed.map_err(|e| HarnessError::parse(format!("seed '{raw}': {e}")))
}

/// `0=1,2=0` -> `[(0, 1), (2, 0)]`.
pub fn parse_exclusion(raw: &str) -> Result<Vec<(usize, usize)>> {
    raw.split(',')
        .map(|term| {
            let term = term.trim();
            let (pos, value) = term
                .split_once('=')
                .ok_or_else(|| HarnessError::parse(format!("exclusion term '{term}' is not pos=value")))?;
            Ok((parse_index(pos, term)?, parse_index(value, term)?))
        })
        .collect()
}

/// `1,*,2,*` -> seed row with positions 1 and 3 free. `*`, `-` and an empty
/// cell all mean free.
pub fn parse_seed_row(raw: &str) -> Result<SeedRow> {
    let values = raw
        .split(',')
        .map(|cell| match cell.trim() {
            "" | "*" | "-" => Ok(None),
            v => parse_index(v, raw).map(Some),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SeedRow::new(values))
}

/// `0,2,4@3` -> positions `[0, 2, 4]` covered 3-wise.
pub fn parse_submodel(raw: &str) -> Result<(Vec<usize>, usize)> {
    let (positions, order) = raw
        .split_once('@')
        .ok_or_else(|| HarnessError::parse(format!("submodel '{raw}' is not positions@order")))?;
    let positions = positions
        .split(',')
        .map(|cell| parse_index(cell, raw))
        .collect::<Result<Vec<_>>>()?;
    Ok((positions, parse_index(order, raw)?))
}

fn parse_index(raw: &str, context: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| HarnessError::parse(format!("'{context}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        assert_eq!(parse_counts("1,3, 3,4").unwrap(), vec![1, 3, 3, 4]);
        assert_eq!(parse_counts("2,-1").unwrap(), vec![2, -1]);
        assert!(parse_counts("2,,3").is_err());
        assert!(parse_counts("two").is_err());
    }

    #[test]
    fn seeds() {
        assert_eq!(parse_seed("42").unwrap(), 42);
        assert_eq!(parse_seed("1_000").unwrap(), 1000);
        assert_eq!(parse_seed("0xDEAD_BEEF").unwrap(), 0xDEAD_BEEF);
        assert_eq!(parse_seed("0Xff").unwrap(), 255);
        assert!(parse_seed("-1").is_err());
        assert!(parse_seed("0xg").is_err());
    }

    #[test]
    fn exclusions() {
        assert_eq!(parse_exclusion("0=1, 2=0").unwrap(), vec![(0, 1), (2, 0)]);
        assert!(parse_exclusion("0:1").is_err());
        assert!(parse_exclusion("0=x").is_err());
    }

    #[test]
    fn submodels() {
        assert_eq!(parse_submodel("0, 2,4@3").unwrap(), (vec![0, 2, 4], 3));
        assert_eq!(parse_submodel("1@1").unwrap(), (vec![1], 1));
        assert!(parse_submodel("0,1,2").is_err());
        assert!(parse_submodel("0,x@2").is_err());
        assert!(parse_submodel("0,1@").is_err());
    }

    #[test]
    fn seed_rows() {
        let row = parse_seed_row("1,*,2,").unwrap();
        assert_eq!(row.values(), &[Some(1), None, Some(2), None]);
        assert_eq!(parse_seed_row("-").unwrap().values(), &[None]);
        assert!(parse_seed_row("1,a").is_err());
    }
}
