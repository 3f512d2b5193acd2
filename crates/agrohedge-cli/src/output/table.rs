use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            // Check if "result" key holds the primary data
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    if let Value::Object(res_map) = result {
        // Scalars first, then one table per nested collection.
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        let mut scalars = 0;
        for (key, val) in res_map {
            if !is_collection(val) {
                builder.push_record([key.as_str(), &format_value(val)]);
                scalars += 1;
            }
        }
        if scalars > 0 {
            println!("{}", Table::from(builder));
        }

        for (key, val) in res_map {
            match val {
                Value::Array(items) if key == "sheets" => print_sheets(items),
                Value::Array(items) if is_collection(val) => {
                    println!("\n{}:", heading(key));
                    print_array_table(items);
                }
                _ => {}
            }
        }
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn is_collection(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.iter().any(|i| i.is_object()))
}

fn heading(key: &str) -> String {
    key.replace('_', " ").to_uppercase()
}

/// Workbook sheets: one grid per sheet, spreadsheet-style column letters.
fn print_sheets(sheets: &[Value]) {
    for sheet in sheets {
        let name = sheet.get("name").and_then(Value::as_str).unwrap_or("?");
        let Some(Value::Array(rows)) = sheet.get("rows") else {
            continue;
        };
        let width = rows
            .iter()
            .filter_map(Value::as_array)
            .map(Vec::len)
            .max()
            .unwrap_or(0);

        let mut builder = Builder::default();
        let mut header = vec![String::new()];
        header.extend((0..width as u32).map(agrohedge_core::workbook::col_to_letters));
        builder.push_record(header);
        for (i, row) in rows.iter().enumerate() {
            let mut record = vec![(i + 1).to_string()];
            let cells = row.as_array().map(Vec::as_slice).unwrap_or(&[]);
            record.extend((0..width).map(|c| cells.get(c).map(format_value).unwrap_or_default()));
            builder.push_record(record);
        }
        println!("\n{}", name);
        println!("{}", Table::from(builder));
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        // Simple array of values
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() != 0.0 => format!("{:.4}", f)
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string(),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        // Non-finite engine outputs arrive as null.
        Value::Null => "n/a".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
