// 設定ファイルのリテラル値
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::settings::Field;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// リテラル値
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(Decimal),
    OutOfRangeFloat(String), // Decimalで表せない浮動小数点数
    Str(String),
    List(Vec<Literal>),
}

/// 同じ長さの '#' で隠す
pub fn mask(secret: &str) -> String {
    "#".repeat(secret.chars().count())
}

/// ログとエラーメッセージ用の値の表記。秘密の設定項目は隠す
pub fn display_value(key: &str, value: &Literal) -> String {
    if Field::from_key(key).is_some_and(|f| f.is_secret()) {
        value.masked()
    } else {
        value.to_string()
    }
}

impl Literal {
    /// 型名
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::None => "NoneType",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) | Literal::OutOfRangeFloat(_) => "float",
            Literal::Str(_) => "str",
            Literal::List(_) => "list",
        }
    }

    /// エラーメッセージ用の "型名 値" 表記
    pub fn describe(&self) -> String {
        format!("{} {}", self.type_name(), self)
    }

    /// 値を '#' で隠した表記
    pub fn masked(&self) -> String {
        match self {
            Literal::Str(s) => format!("'{}'", mask(s)),
            other => mask(&other.to_string()),
        }
    }

    /// 数値トークンからリテラル値を作る
    /// "_" 区切りを取り除き、小数点か指数部があれば浮動小数点数とする
    pub fn from_number_token(token: &str) -> Result<Literal, String> {
        let cleaned = token.replace('_', "");
        let unsigned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
        if unsigned.contains(['e', 'E', '.']) {
            Ok(Self::float_from_token(unsigned))
        } else {
            i64::from_str(unsigned)
                .map(Literal::Int)
                .map_err(|e| format!(r#"数値 "{token}" を解析できません: {e}"#))
        }
    }

    // Decimalで表せない値(桁あふれ, 0に丸められる値)は範囲外とする
    fn float_from_token(token: &str) -> Literal {
        let (mantissa, exponent) = match token.find(['e', 'E']) {
            Some(i) => token.split_at(i),
            None => (token, ""),
        };
        // ".5" 形式は先頭に、"5." 形式は末尾に0を補う
        let mut normalized = match mantissa.strip_prefix('-') {
            Some(m) if m.starts_with('.') => format!("-0{m}"),
            _ if mantissa.starts_with('.') => format!("0{mantissa}"),
            _ => mantissa.to_owned(),
        };
        if normalized.ends_with('.') {
            normalized.push('0');
        }
        let decimal = if exponent.is_empty() {
            Decimal::from_str(&normalized)
        } else {
            Decimal::from_scientific(&format!("{normalized}{}", exponent.to_ascii_lowercase()))
        };
        let nonzero = mantissa.chars().any(|c| ('1'..='9').contains(&c));
        match decimal {
            Ok(d) if d.is_zero() && nonzero => Literal::OutOfRangeFloat(token.to_owned()),
            Ok(d) => Literal::Float(d),
            Err(_) => Literal::OutOfRangeFloat(token.to_owned()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::None => write!(f, "None"),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Float(d) => write!(f, "{d}"),
            Literal::OutOfRangeFloat(t) => write!(f, "{t}"),
            Literal::Str(s) => write!(f, "'{s}'"),
            Literal::List(xs) => {
                let items = xs.iter().map(|x| x.to_string()).collect::<Vec<_>>();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// 設定値1つ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub line: Option<usize>, // 記述行(1始まり)
    pub value: Literal,
}

/// キーと値の組の集まり
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsDocument {
    entries: HashMap<String, Entry>,
}

impl SettingsDocument {
    /// 値を登録する。同じキーは後勝ち
    pub fn insert(&mut self, key: &str, entry: Entry) {
        if let Some(prev) = self.entries.insert(key.to_owned(), entry) {
            tracing::warn!(
                "{key} is assigned more than once, the earlier value {} is overridden",
                display_value(key, &prev.value)
            );
        }
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[test]
fn test1() {
    use rust_decimal::dec;

    assert_eq!(Literal::from_number_token("1883"), Ok(Literal::Int(1883)));
    assert_eq!(Literal::from_number_token("-5"), Ok(Literal::Int(-5)));
    assert_eq!(Literal::from_number_token("+7"), Ok(Literal::Int(7)));
    assert_eq!(
        Literal::from_number_token("912_000_000"),
        Ok(Literal::Int(912_000_000))
    );
    assert_eq!(Literal::from_number_token("0.10"), Ok(Literal::Float(dec!(0.10))));
    assert_eq!(Literal::from_number_token("5."), Ok(Literal::Float(dec!(5))));
    assert_eq!(Literal::from_number_token(".5"), Ok(Literal::Float(dec!(0.5))));
    assert_eq!(Literal::from_number_token("-.5"), Ok(Literal::Float(dec!(-0.5))));
    assert_eq!(Literal::from_number_token("1e3"), Ok(Literal::Float(dec!(1000))));
    assert_eq!(Literal::from_number_token("1.5E-2"), Ok(Literal::Float(dec!(0.015))));
    assert_eq!(Literal::from_number_token("0.0e5"), Ok(Literal::Float(dec!(0))));
    assert!(Literal::from_number_token("99999999999999999999").is_err());
}

#[test]
fn test2() {
    let xs = Literal::List(vec![
        Literal::Str("r900".to_string()),
        Literal::Int(12345678),
        Literal::Bool(true),
        Literal::None,
    ]);
    assert_eq!(xs.to_string(), "['r900', 12345678, True, None]");
    assert_eq!(xs.type_name(), "list");
    assert_eq!(Literal::Str("1883".to_string()).describe(), "str '1883'");
}

#[test]
fn test3() {
    let mut doc = SettingsDocument::default();
    doc.insert(
        "MQTT_PORT",
        Entry {
            line: Some(1),
            value: Literal::Int(1883),
        },
    );
    doc.insert(
        "MQTT_PORT",
        Entry {
            line: Some(2),
            value: Literal::Int(8883),
        },
    );
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.get("MQTT_PORT").map(|e| &e.value), Some(&Literal::Int(8883)));
    assert_eq!(doc.get("MQTT_PORT").and_then(|e| e.line), Some(2));
}

#[test]
fn test4() {
    // Decimalで表せない値は範囲外
    assert_eq!(
        Literal::from_number_token("1e30"),
        Ok(Literal::OutOfRangeFloat("1e30".to_string()))
    );
    assert_eq!(
        Literal::from_number_token("1e-30"),
        Ok(Literal::OutOfRangeFloat("1e-30".to_string()))
    );
    assert_eq!(
        Literal::from_number_token("0.0000000000000000000000000000001"),
        Ok(Literal::OutOfRangeFloat(
            "0.0000000000000000000000000000001".to_string()
        ))
    );
    assert_eq!(Literal::OutOfRangeFloat("1e30".to_string()).describe(), "float 1e30");
}

#[test]
fn test5() {
    // MQTT_PASSWORD の値は隠す
    let secret = Literal::Str("hunter2".to_string());
    assert_eq!(display_value("MQTT_PASSWORD", &secret), "'#######'");
    assert_eq!(display_value("MQTT_PASSWORD", &Literal::Int(123456)), "######");
    assert_eq!(display_value("MQTT_USER", &secret), "'hunter2'");
    assert_eq!(mask("hunter2"), "#######");
}
