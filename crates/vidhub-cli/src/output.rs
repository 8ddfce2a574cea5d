//! Table and JSON rendering of command results.

use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Prints rows as a table, or as a JSON array.
pub fn print_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat, empty: &str) {
    match format {
        OutputFormat::Table if rows.is_empty() => println!("{empty}"),
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Json => print_json(rows),
    }
}

/// Prints one value as indented `key: value` lines, or as JSON.
pub fn print_item<T: Serialize>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => match serde_json::to_value(item) {
            Ok(value) => print_tree(&value, 0),
            Err(e) => print_error(&format!("Cannot render output: {e}")),
        },
        OutputFormat::Json => print_json(item),
    }
}

fn print_json<T: Serialize + ?Sized>(item: &T) {
    match serde_json::to_string_pretty(item) {
        Ok(json) => println!("{json}"),
        Err(e) => print_error(&format!("Cannot render output: {e}")),
    }
}

fn print_tree(value: &Value, depth: usize) {
    let Value::Object(map) = value else {
        println!("{:indent$}{value}", "", indent = depth * 2);
        return;
    };
    for (key, child) in map {
        match child {
            Value::Object(_) => {
                println!("{:indent$}[{key}]", "", indent = depth * 2);
                print_tree(child, depth + 1);
            }
            Value::String(s) => print_kv_at(depth, key, s),
            other => print_kv_at(depth, key, &other.to_string()),
        }
    }
}

pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Prints an aligned `key: value` line.
pub fn print_kv(key: &str, value: &str) {
    print_kv_at(1, key, value);
}

fn print_kv_at(depth: usize, key: &str, value: &str) {
    println!("{:indent$}{:<24} {value}", "", format!("{key}:"), indent = depth * 2);
}
