// 設定読み込みエラー
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::settings::Field;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(r#"入出力エラー "{0}""#)]
    Io(#[from] io::Error),

    #[error(
        "文法エラー{}: {message}",
        .line.map(|n| format!("({n}行目)")).unwrap_or_default()
    )]
    Syntax {
        line: Option<usize>,
        message: String,
    },

    #[error("{0} がありません")]
    MissingField(Field),

    #[error("{field} は {expected} 型でなければなりません。値: {found}")]
    TypeInvalid {
        field: Field,
        expected: &'static str,
        found: String,
    },

    #[error("{field}: {reason}")]
    ConstraintViolation { field: Field, reason: String },
}

/// エラーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    Io,
    Syntax,
    MissingField,
    TypeInvalid,
    ConstraintViolation,
}

impl ConfigError {
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            ConfigError::Io(_) => ConfigErrorKind::Io,
            ConfigError::Syntax { .. } => ConfigErrorKind::Syntax,
            ConfigError::MissingField(_) => ConfigErrorKind::MissingField,
            ConfigError::TypeInvalid { .. } => ConfigErrorKind::TypeInvalid,
            ConfigError::ConstraintViolation { .. } => ConfigErrorKind::ConstraintViolation,
        }
    }

    /// 原因となった設定項目
    pub fn field(&self) -> Option<Field> {
        match self {
            ConfigError::MissingField(field) => Some(*field),
            ConfigError::TypeInvalid { field, .. } => Some(*field),
            ConfigError::ConstraintViolation { field, .. } => Some(*field),
            ConfigError::Io(_) | ConfigError::Syntax { .. } => None,
        }
    }

    pub(crate) fn constraint(field: Field, reason: impl Into<String>) -> Self {
        ConfigError::ConstraintViolation {
            field,
            reason: reason.into(),
        }
    }
}

#[test]
fn test1() {
    let e = ConfigError::Syntax {
        line: Some(12),
        message: "予期しない字句".to_string(),
    };
    assert_eq!(e.to_string(), "文法エラー(12行目): 予期しない字句");
    assert_eq!(e.kind(), ConfigErrorKind::Syntax);
    assert_eq!(e.field(), None);

    let e = ConfigError::Syntax {
        line: None,
        message: "予期しない字句".to_string(),
    };
    assert_eq!(e.to_string(), "文法エラー: 予期しない字句");
}

#[test]
fn test2() {
    let e = ConfigError::MissingField(Field::MqttHost);
    assert_eq!(e.to_string(), "MQTT_HOST がありません");
    assert_eq!(e.field(), Some(Field::MqttHost));

    let e = ConfigError::TypeInvalid {
        field: Field::MqttPort,
        expected: "int",
        found: "str '1883'".to_string(),
    };
    assert_eq!(
        e.to_string(),
        "MQTT_PORT は int 型でなければなりません。値: str '1883'"
    );
    assert_eq!(e.kind(), ConfigErrorKind::TypeInvalid);

    let e = ConfigError::constraint(Field::MsgType, "プロトコルを1つ以上指定してください");
    assert_eq!(e.to_string(), "MSGTYPE: プロトコルを1つ以上指定してください");
    assert_eq!(e.field(), Some(Field::MsgType));
}
