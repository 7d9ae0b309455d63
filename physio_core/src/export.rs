//! CSV export for results, trajectories, and sweep grids.
//!
//! Nested records are flattened into dotted column names. Columns are the
//! union of every row's fields in first-seen order; missing cells are empty.

use crate::sweep::SweepGrid;
use crate::Result;
use serde_json::Value;
use std::io::Write;

/// Flatten a JSON record into `(column, text)` pairs
pub fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into(value, None, &mut out);
    out
}

fn flatten_into(value: &Value, prefix: Option<&str>, out: &mut Vec<(String, String)>) {
    let column = |key: &str| match prefix {
        Some(p) => format!("{}.{}", p, key),
        None => key.to_string(),
    };

    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                flatten_into(inner, Some(&column(key)), out);
            }
        }
        scalar => {
            let name = prefix.unwrap_or("value").to_string();
            let text = match scalar {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out.push((name, text));
        }
    }
}

/// Write flattened records as CSV with a shared header
pub fn write_rows_csv<W: Write>(rows: &[Value], writer: W) -> Result<()> {
    write_flat_csv(rows.iter().map(flatten).collect(), writer)
}

fn write_flat_csv<W: Write>(flat: Vec<Vec<(String, String)>>, writer: W) -> Result<()> {
    let mut columns: Vec<String> = Vec::new();
    for row in &flat {
        for (name, _) in row {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&columns)?;
    for row in &flat {
        let record = columns.iter().map(|col| {
            row.iter()
                .find(|(name, _)| name == col)
                .map(|(_, text)| text.as_str())
                .unwrap_or("")
        });
        csv.write_record(record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write a serialized trajectory as one row per point: the stepped
/// parameter first, then the flattened result
pub fn write_trajectory_csv<W: Write>(trajectory: &Value, writer: W) -> Result<()> {
    let parameter = trajectory
        .get("parameter")
        .and_then(Value::as_str)
        .unwrap_or("x");
    let points = trajectory
        .get("points")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let flat = points
        .iter()
        .map(|p| {
            let mut row = vec![(parameter.to_string(), p["x"].to_string())];
            row.extend(flatten(&p["result"]));
            row
        })
        .collect();

    write_flat_csv(flat, writer)
}

/// Write a sweep grid as a matrix: one row per `y`, one column per `x`
pub fn write_sweep_csv<W: Write>(grid: &SweepGrid, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let corner = format!("{}\\{}", grid.y.name, grid.x.name);
    let mut header = vec![corner];
    header.extend(grid.x.values.iter().map(|v| v.to_string()));
    csv.write_record(&header)?;

    for (yv, row) in grid.y.values.iter().zip(&grid.cells) {
        let mut record = vec![yv.to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::Axis;
    use serde_json::json;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_flatten_nested() {
        let flat = flatten(&json!({
            "spo2_pct": 88.5,
            "tier": "moderate",
            "band": { "min_seconds": 300, "max_seconds": 600 },
            "missing": null
        }));
        assert!(flat.contains(&("spo2_pct".to_string(), "88.5".to_string())));
        assert!(flat.contains(&("tier".to_string(), "moderate".to_string())));
        assert!(flat.contains(&("band.min_seconds".to_string(), "300".to_string())));
        assert!(flat.contains(&("missing".to_string(), String::new())));
    }

    #[test]
    fn test_rows_take_column_union() {
        let rows = vec![json!({ "a": 1, "b": null }), json!({ "a": 2, "b": { "c": 3 } })];
        let text = render(|buf| write_rows_csv(&rows, buf));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "a,b,b.c");
        assert_eq!(lines[1], "1,,");
        assert_eq!(lines[2], "2,,3");
    }

    #[test]
    fn test_trajectory_columns() {
        let traj = json!({
            "model": "circadian",
            "parameter": "time_h",
            "points": [
                { "x": 0.0, "result": { "performance": 0.5 } },
                { "x": 1.0, "result": { "performance": 0.25 } }
            ]
        });
        let text = render(|buf| write_trajectory_csv(&traj, buf));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["time_h,performance", "0.0,0.5", "1.0,0.25"]);
    }

    #[test]
    fn test_sweep_matrix() {
        let grid = SweepGrid {
            model: "utci",
            metric: "utci_c".into(),
            x: Axis::new("air_temp_c", vec![0.0, 10.0]),
            y: Axis::new("wind_speed", vec![1.0]),
            cells: vec![vec![-2.5, 8.0]],
            replaced: 0,
        };
        let text = render(|buf| write_sweep_csv(&grid, buf));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "wind_speed\\air_temp_c,0,10");
        assert_eq!(lines[1], "1,-2.5,8");
    }
}
