// 設定ファイル(KEY = リテラル値 形式)のパーサー
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::settings::{ConfigError, Entry, Field, Literal, SettingsDocument, display_value};
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_while, take_while1};
use nom::character::complete::{char, one_of, space0};
use nom::combinator::{all_consuming, eof, map, map_res, opt, recognize, rest, value};
use nom::multi::separated_list0;
use nom::sequence::{delimited, preceded};
use nom::{IResult, Parser};

// 識別子
fn identifier(s: &str) -> IResult<&str, &str> {
    recognize((
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(s)
}

// 数字の並び("_"区切り可)
fn digits(s: &str) -> IResult<&str, &str> {
    recognize((
        take_while1(|c: char| c.is_ascii_digit()),
        take_while(|c: char| c.is_ascii_digit() || c == '_'),
    ))
    .parse(s)
}

// 整数, 浮動小数点数(1, 1.5, 1., .5, 1e3)
fn number(s: &str) -> IResult<&str, Literal> {
    let mantissa = alt((
        recognize((digits, opt((char('.'), opt(digits))))),
        recognize((char('.'), digits)),
    ));
    let parser = recognize((
        opt(one_of("+-")),
        mantissa,
        opt((one_of("eE"), opt(one_of("+-")), digits)),
    ));
    map_res(parser, Literal::from_number_token).parse(s)
}

// '文字列' または "文字列"
fn string(s: &str) -> IResult<&str, Literal> {
    let single = delimited(char('\''), opt(is_not("'")), char('\''));
    let double = delimited(char('"'), opt(is_not("\"")), char('"'));
    map(alt((single, double)), |a: Option<&str>| {
        Literal::Str(a.unwrap_or_default().to_owned())
    })
    .parse(s)
}

// True, False, None
fn keyword(s: &str) -> IResult<&str, Literal> {
    alt((
        value(Literal::Bool(true), tag("True")),
        value(Literal::Bool(false), tag("False")),
        value(Literal::None, tag("None")),
    ))
    .parse(s)
}

// [リテラル値, ...]
fn list(s: &str) -> IResult<&str, Literal> {
    let (s, _) = (char('['), space0).parse(s)?;
    let (s, items) = separated_list0((space0, char(','), space0), literal).parse(s)?;
    // 末尾のカンマは要素の後ろにだけ置ける
    let (s, _) = if items.is_empty() {
        (s, None)
    } else {
        opt((space0, char(','))).parse(s)?
    };
    let (s, _) = (space0, char(']')).parse(s)?;
    Ok((s, Literal::List(items)))
}

/// リテラル値
pub fn literal(s: &str) -> IResult<&str, Literal> {
    alt((list, string, keyword, number)).parse(s)
}

// # コメント
fn comment(s: &str) -> IResult<&str, &str> {
    preceded(char('#'), rest).parse(s)
}

/// KEY = リテラル値 # コメント
pub fn assignment(s: &str) -> IResult<&str, (&str, Literal)> {
    let (s, key) = identifier.parse(s)?;
    let (s, _) = (space0, char('='), space0).parse(s)?;
    let (s, value) = literal.parse(s)?;
    let (s, _) = (space0, opt(comment), eof).parse(s)?;
    Ok((s, (key, value)))
}

/// 設定ファイルを解析する
pub fn parse_document(source: &str) -> Result<SettingsDocument, ConfigError> {
    let mut document = SettingsDocument::default();
    for (n, line) in source.lines().enumerate() {
        let line_number = n + 1;
        let trimmed = line.trim_end();
        let content = trimmed.trim_start();
        // 空行とコメント行は読み飛ばす
        if content.is_empty() || content.starts_with('#') {
            continue;
        }
        if content.len() != trimmed.len() {
            return Err(ConfigError::Syntax {
                line: Some(line_number),
                message: "インデントできません".to_string(),
            });
        }
        match all_consuming(assignment).parse(trimmed) {
            Ok((_, (key, value))) => {
                tracing::trace!("line {line_number}: {key} = {}", display_value(key, &value));
                document.insert(
                    key,
                    Entry {
                        line: Some(line_number),
                        value,
                    },
                );
            }
            Err(e) => {
                // 秘密の設定項目は行の内容を出さない
                let secret = identifier(trimmed)
                    .ok()
                    .and_then(|(_, key)| Field::from_key(key))
                    .filter(|field| field.is_secret());
                let message = match secret {
                    Some(field) => format!("{field} の値を解析できません"),
                    None => {
                        tracing::debug!("line {line_number}: {e:?}");
                        format!(r#""{trimmed}" を解析できません"#)
                    }
                };
                return Err(ConfigError::Syntax {
                    line: Some(line_number),
                    message,
                });
            }
        }
    }
    Ok(document)
}

#[test]
fn test1() {
    use rust_decimal::dec;

    assert_eq!(literal("True").unwrap(), ("", Literal::Bool(true)));
    assert_eq!(literal("False").unwrap(), ("", Literal::Bool(false)));
    assert_eq!(literal("None").unwrap(), ("", Literal::None));
    assert_eq!(literal("900").unwrap(), ("", Literal::Int(900)));
    assert_eq!(literal("-1").unwrap(), ("", Literal::Int(-1)));
    assert_eq!(
        literal("0.10").unwrap(),
        ("", Literal::Float(dec!(0.10)))
    );
    assert_eq!(literal(".5").unwrap(), ("", Literal::Float(dec!(0.5))));
    assert_eq!(literal("-.25").unwrap(), ("", Literal::Float(dec!(-0.25))));
    assert_eq!(literal("5.").unwrap(), ("", Literal::Float(dec!(5))));
    assert_eq!(
        literal("1e30").unwrap(),
        ("", Literal::OutOfRangeFloat("1e30".to_string()))
    );
    assert_eq!(
        literal("'/usr/bin/rtl_tcp'").unwrap(),
        ("", Literal::Str("/usr/bin/rtl_tcp".to_string()))
    );
    assert_eq!(
        literal(r#""127.0.0.1""#).unwrap(),
        ("", Literal::Str("127.0.0.1".to_string()))
    );
    assert_eq!(literal("''").unwrap(), ("", Literal::Str(String::new())));
}

#[test]
fn test2() {
    assert_eq!(literal("[]").unwrap(), ("", Literal::List(vec![])));
    assert_eq!(literal("[ ]").unwrap(), ("", Literal::List(vec![])));
    assert_eq!(
        literal("[8675309, 123456789]").unwrap(),
        (
            "",
            Literal::List(vec![Literal::Int(8675309), Literal::Int(123456789)])
        )
    );
    assert_eq!(
        literal("['r900', 'idm',]").unwrap(),
        (
            "",
            Literal::List(vec![
                Literal::Str("r900".to_string()),
                Literal::Str("idm".to_string())
            ])
        )
    );
    assert_eq!(
        literal("[[1], []]").unwrap(),
        (
            "",
            Literal::List(vec![
                Literal::List(vec![Literal::Int(1)]),
                Literal::List(vec![])
            ])
        )
    );
    assert!(literal("[1, 2").is_err());
    assert!(literal("[,]").is_err());
    assert!(literal("[ , ]").is_err());
    assert!(literal("[1,,]").is_err());
    assert!(literal(".").is_err());
}

#[test]
fn test3() {
    assert_eq!(
        assignment("METER_UPDATE_PERIOD=900").unwrap(),
        ("", ("METER_UPDATE_PERIOD", Literal::Int(900)))
    );
    assert_eq!(
        assignment("RTLAMR_LOW_CPU = False ").unwrap(),
        ("", ("RTLAMR_LOW_CPU", Literal::Bool(false)))
    );
    assert_eq!(
        assignment("MQTT_HOST = 'broker#1' # comment").unwrap(),
        ("", ("MQTT_HOST", Literal::Str("broker#1".to_string())))
    );
    assert!(assignment("MQTT_PORT = 1883 1884").is_err());
    assert!(assignment("MQTT_PORT 1883").is_err());
    assert!(assignment("1ST = 1").is_err());
}

#[test]
fn test4() {
    let source = [
        "# comment line",
        "#WATCHED_METERS = [8675309, 123456789]",
        "WATCHED_METERS = []",
        "",
        "MSGTYPE = ['r900']",
        " ",
        "MQTT_PORT = 1883",
    ]
    .join("\n");

    let doc = parse_document(&source).unwrap();
    assert_eq!(doc.len(), 3);
    assert_eq!(
        doc.get("WATCHED_METERS"),
        Some(&Entry {
            line: Some(3),
            value: Literal::List(vec![])
        })
    );
    assert_eq!(doc.get("MQTT_PORT").and_then(|e| e.line), Some(7));
}

#[test]
fn test5() {
    let source = "MQTT_PORT = 1883\nMQTT_HOST = 127.0.0.1\n";
    match parse_document(source) {
        Err(ConfigError::Syntax { line, .. }) => assert_eq!(line, Some(2)),
        other => panic!("unexpected {other:?}"),
    }

    let source = "MQTT_PORT = 1883\n  MQTT_HOST = 'localhost'\n";
    match parse_document(source) {
        Err(ConfigError::Syntax { line, message }) => {
            assert_eq!(line, Some(2));
            assert_eq!(message, "インデントできません");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test6() {
    // パスワードは文法エラーのメッセージに出さない
    let source = "MQTT_USER = 'meter'\nMQTT_PASSWORD = 's3cret' 'tail'\n";
    match parse_document(source) {
        Err(e @ ConfigError::Syntax { .. }) => {
            let text = e.to_string();
            assert!(text.contains("2行目"));
            assert!(text.contains("MQTT_PASSWORD"));
            assert!(!text.contains("s3cret"));
        }
        other => panic!("unexpected {other:?}"),
    }

    // 他の項目は行の内容を示す
    let source = "MQTT_HOST = 'a' 'b'\n";
    match parse_document(source) {
        Err(ConfigError::Syntax { message, .. }) => {
            assert_eq!(message, r#""MQTT_HOST = 'a' 'b'" を解析できません"#)
        }
        other => panic!("unexpected {other:?}"),
    }
}
