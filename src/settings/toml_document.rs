// TOML形式の設定ファイル
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::settings::{ConfigError, Entry, Literal, SettingsDocument};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use toml::{Table, Value};

// TOMLの値をリテラル値に変換する
fn to_literal(key: &str, value: Value) -> Result<Literal, ConfigError> {
    match value {
        Value::String(s) => Ok(Literal::Str(s)),
        Value::Integer(n) => Ok(Literal::Int(n)),
        // Decimalで表せない値(桁あふれ, 0に丸められる値, inf, NaN)は範囲外とする
        Value::Float(f) => match Decimal::from_f64(f) {
            Some(d) if !d.is_zero() || f == 0.0 => Ok(Literal::Float(d)),
            _ => Ok(Literal::OutOfRangeFloat(f.to_string())),
        },
        Value::Boolean(b) => Ok(Literal::Bool(b)),
        Value::Array(xs) => xs
            .into_iter()
            .map(|x| to_literal(key, x))
            .collect::<Result<Vec<_>, _>>()
            .map(Literal::List),
        other => Err(ConfigError::Syntax {
            line: None,
            message: format!("{key}: {} 型の値は使えません", other.type_str()),
        }),
    }
}

/// TOML形式の設定ファイルを解析する
pub fn parse_toml_document(source: &str) -> Result<SettingsDocument, ConfigError> {
    let table = source.parse::<Table>().map_err(|e| ConfigError::Syntax {
        line: e
            .span()
            .map(|span| source[..span.start].matches('\n').count() + 1),
        message: e.message().to_string(),
    })?;

    let mut document = SettingsDocument::default();
    for (key, value) in table {
        let value = to_literal(&key, value)?;
        document.insert(&key, Entry { line: None, value });
    }
    Ok(document)
}

#[test]
fn test1() {
    let source = r#"
WATCHED_METERS = [8675309, 123456789]
MSGTYPE = ["r900", "idm"]
RTLAMR_SINGLE_MODE = true
WH_MULTIPLIER = 1000
GALLONS_MULTIPLIER = 0.5
"#;
    let doc = parse_toml_document(source).unwrap();
    assert_eq!(doc.len(), 5);
    assert_eq!(
        doc.get("WATCHED_METERS").map(|e| &e.value),
        Some(&Literal::List(vec![
            Literal::Int(8675309),
            Literal::Int(123456789)
        ]))
    );
    assert_eq!(
        doc.get("RTLAMR_SINGLE_MODE").map(|e| &e.value),
        Some(&Literal::Bool(true))
    );
    assert_eq!(
        doc.get("GALLONS_MULTIPLIER").map(|e| &e.value),
        Some(&Literal::Float(rust_decimal::dec!(0.5)))
    );
}

#[test]
fn test2() {
    match parse_toml_document("MQTT_PORT = 1883\nMQTT_HOST = 'a' 'b'\n") {
        Err(ConfigError::Syntax { line, .. }) => assert_eq!(line, Some(2)),
        other => panic!("unexpected {other:?}"),
    }

    match parse_toml_document("[MQTT]\nPORT = 1883\n") {
        Err(ConfigError::Syntax { line, message }) => {
            assert_eq!(line, None);
            assert!(message.starts_with("MQTT:"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test3() {
    let source = "GALLONS_MULTIPLIER = 1e-30\nWH_MULTIPLIER = 1e30\nRTLAMR_LOW_CPU = 0.0\n";
    let doc = parse_toml_document(source).unwrap();
    assert!(matches!(
        doc.get("GALLONS_MULTIPLIER").map(|e| &e.value),
        Some(Literal::OutOfRangeFloat(_))
    ));
    assert!(matches!(
        doc.get("WH_MULTIPLIER").map(|e| &e.value),
        Some(Literal::OutOfRangeFloat(_))
    ));
    assert_eq!(
        doc.get("RTLAMR_LOW_CPU").map(|e| &e.value),
        Some(&Literal::Float(Decimal::ZERO))
    );
}
