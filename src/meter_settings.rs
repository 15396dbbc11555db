// メーター監視設定
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::settings::{
    ConfigError, Field, Literal, SettingsDocument, mask, parse_document, parse_toml_document,
};
use crate::units::UnitConversion;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::num::{NonZeroU32, NonZeroU64};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// メーターID
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct MeterId(pub u32);

impl fmt::Display for MeterId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 無線プロトコル
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MsgType {
    R900,
    Idm,
}

impl FromStr for MsgType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r900" => Ok(MsgType::R900),
            "idm" => Ok(MsgType::Idm),
            _ => Err(format!(
                r#"プロトコル "{s}" は使えません。r900 または idm を指定してください"#
            )),
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MsgType::R900 => f.write_str("r900"),
            MsgType::Idm => f.write_str("idm"),
        }
    }
}

/// MQTT認証情報
#[derive(Serialize, Clone, PartialEq, Eq)]
pub struct MqttCredentials<'a> {
    pub user: &'a str,
    #[serde(serialize_with = "masked")]
    pub password: &'a str,
}

impl fmt::Debug for MqttCredentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MqttCredentials")
            .field("user", &self.user)
            .field("password", &mask(self.password))
            .finish()
    }
}

/// メーター監視設定
///
/// 起動時に一度だけ読み込み、以降は変更しない。
#[derive(Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Settings {
    watched_meters: BTreeSet<MeterId>,
    msgtype: BTreeSet<MsgType>,
    rtlamr_single_mode: bool,
    meter_update_period: NonZeroU64,
    rtlamr_low_cpu: bool,
    #[serde(with = "rust_decimal::serde::float")]
    gallons_multiplier: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    wh_multiplier: Decimal,
    readings_per_hour: NonZeroU32,
    mqtt_host: String,
    mqtt_port: u16,
    mqtt_user: String,
    #[serde(serialize_with = "masked")]
    mqtt_password: String,
    rtlamr: PathBuf,
    rtl_tcp: PathBuf,
}

// パスワードは同じ長さの '#' で隠す
fn masked<S>(password: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&mask(password))
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Settings")
            .field("watched_meters", &self.watched_meters)
            .field("msgtype", &self.msgtype)
            .field("rtlamr_single_mode", &self.rtlamr_single_mode)
            .field("meter_update_period", &self.meter_update_period)
            .field("rtlamr_low_cpu", &self.rtlamr_low_cpu)
            .field("gallons_multiplier", &self.gallons_multiplier)
            .field("wh_multiplier", &self.wh_multiplier)
            .field("readings_per_hour", &self.readings_per_hour)
            .field("mqtt_host", &self.mqtt_host)
            .field("mqtt_port", &self.mqtt_port)
            .field("mqtt_user", &self.mqtt_user)
            .field("mqtt_password", &mask(&self.mqtt_password))
            .field("rtlamr", &self.rtlamr)
            .field("rtl_tcp", &self.rtl_tcp)
            .finish()
    }
}

impl Settings {
    /// 監視対象のメーターID(空なら全メーター)
    pub fn watched_meters(&self) -> &BTreeSet<MeterId> {
        &self.watched_meters
    }

    pub fn watches_all_meters(&self) -> bool {
        self.watched_meters.is_empty()
    }

    /// 受信するプロトコル(1つ以上)
    pub fn msgtype(&self) -> &BTreeSet<MsgType> {
        &self.msgtype
    }

    /// 設定ファイルに書かれた RTLAMR_SINGLE_MODE の値
    pub fn rtlamr_single_mode(&self) -> bool {
        self.rtlamr_single_mode
    }

    /// 実際に使うシングルモード。低CPUモードなら常にシングルモード
    pub fn single_mode(&self) -> bool {
        self.rtlamr_single_mode || self.rtlamr_low_cpu
    }

    pub fn rtlamr_low_cpu(&self) -> bool {
        self.rtlamr_low_cpu
    }

    /// メーターの値更新周期
    pub fn meter_update_period(&self) -> Duration {
        Duration::from_secs(self.meter_update_period.get())
    }

    pub fn units(&self) -> UnitConversion {
        UnitConversion {
            gallons_multiplier: self.gallons_multiplier,
            wh_multiplier: self.wh_multiplier,
            readings_per_hour: self.readings_per_hour,
        }
    }

    pub fn mqtt_host(&self) -> &str {
        &self.mqtt_host
    }

    pub fn mqtt_port(&self) -> u16 {
        self.mqtt_port
    }

    /// MQTT認証情報。ユーザー名とパスワードが両方とも空なら認証なし
    pub fn mqtt_credentials(&self) -> Option<MqttCredentials<'_>> {
        if self.mqtt_user.is_empty() && self.mqtt_password.is_empty() {
            None
        } else {
            Some(MqttCredentials {
                user: &self.mqtt_user,
                password: &self.mqtt_password,
            })
        }
    }

    pub fn rtlamr_path(&self) -> &Path {
        &self.rtlamr
    }

    pub fn rtl_tcp_path(&self) -> &Path {
        &self.rtl_tcp
    }

    /// TOML形式の設定から読み込む
    pub fn from_toml_str(source: &str) -> Result<Settings, ConfigError> {
        Settings::try_from(&parse_toml_document(source)?)
    }

    /// 設定ファイルを読み込む
    /// 拡張子が .toml ならTOML形式、それ以外は KEY = 値 形式とする
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        tracing::debug!(r#"read "{}" ({} bytes)"#, path.display(), source.len());
        if is_toml {
            Settings::from_toml_str(&source)
        } else {
            Settings::from_str(&source)
        }
    }
}

impl FromStr for Settings {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Settings::try_from(&parse_document(s)?)
    }
}

/// 設定値を取り出して型を確かめる
struct Extractor<'a> {
    document: &'a SettingsDocument,
}

impl<'a> Extractor<'a> {
    fn required(&self, field: Field) -> Result<&'a Literal, ConfigError> {
        self.document
            .get(field.key())
            .map(|entry| &entry.value)
            .ok_or(ConfigError::MissingField(field))
    }

    fn invalid(field: Field, expected: &'static str, found: &Literal) -> ConfigError {
        let found = if field.is_secret() {
            format!("{} {}", found.type_name(), found.masked())
        } else {
            found.describe()
        };
        ConfigError::TypeInvalid {
            field,
            expected,
            found,
        }
    }

    fn boolean(&self, field: Field) -> Result<bool, ConfigError> {
        match self.required(field)? {
            Literal::Bool(b) => Ok(*b),
            other => Err(Self::invalid(field, "bool", other)),
        }
    }

    fn integer(&self, field: Field) -> Result<i64, ConfigError> {
        match self.required(field)? {
            Literal::Int(n) => Ok(*n),
            other => Err(Self::invalid(field, "int", other)),
        }
    }

    // 整数も受け付ける
    fn decimal(&self, field: Field) -> Result<Decimal, ConfigError> {
        match self.required(field)? {
            Literal::Float(d) => Ok(*d),
            Literal::Int(n) => Ok(Decimal::from(*n)),
            Literal::OutOfRangeFloat(t) => Err(ConfigError::constraint(
                field,
                format!("{t} は範囲外です"),
            )),
            other => Err(Self::invalid(field, "float", other)),
        }
    }

    fn string(&self, field: Field) -> Result<&'a str, ConfigError> {
        match self.required(field)? {
            Literal::Str(s) => Ok(s.as_str()),
            other => Err(Self::invalid(field, "str", other)),
        }
    }

    fn list(&self, field: Field) -> Result<&'a [Literal], ConfigError> {
        match self.required(field)? {
            Literal::List(xs) => Ok(xs.as_slice()),
            other => Err(Self::invalid(field, "list", other)),
        }
    }

    fn positive_decimal(&self, field: Field) -> Result<Decimal, ConfigError> {
        let d = self.decimal(field)?;
        if d > Decimal::ZERO {
            Ok(d)
        } else {
            Err(ConfigError::constraint(
                field,
                format!("0より大きい値を指定してください。値: {d}"),
            ))
        }
    }

    fn path(&self, field: Field) -> Result<PathBuf, ConfigError> {
        let s = self.string(field)?;
        if s.trim().is_empty() {
            Err(ConfigError::constraint(field, "パスを指定してください"))
        } else {
            Ok(PathBuf::from(s))
        }
    }
}

impl TryFrom<&SettingsDocument> for Settings {
    type Error = ConfigError;

    fn try_from(document: &SettingsDocument) -> Result<Self, Self::Error> {
        // 知らないキーは無視する
        for key in document.keys() {
            if Field::from_key(key).is_none() {
                tracing::warn!(r#"unknown setting "{key}" is IGNORED"#);
            }
        }

        let x = Extractor { document };

        // WATCHED_METERS
        let watched_meters = x
            .list(Field::WatchedMeters)?
            .iter()
            .map(|item| match item {
                Literal::Int(n) => u32::try_from(*n).map(MeterId).map_err(|_| {
                    ConfigError::constraint(
                        Field::WatchedMeters,
                        format!("メーターID {n} は範囲外です"),
                    )
                }),
                other => Err(Extractor::invalid(
                    Field::WatchedMeters,
                    "list of int",
                    other,
                )),
            })
            .collect::<Result<BTreeSet<MeterId>, ConfigError>>()?;

        // MSGTYPE
        let msgtype = x
            .list(Field::MsgType)?
            .iter()
            .map(|item| match item {
                Literal::Str(s) => MsgType::from_str(s)
                    .map_err(|reason| ConfigError::constraint(Field::MsgType, reason)),
                other => Err(Extractor::invalid(Field::MsgType, "list of str", other)),
            })
            .collect::<Result<BTreeSet<MsgType>, ConfigError>>()?;
        if msgtype.is_empty() {
            return Err(ConfigError::constraint(
                Field::MsgType,
                "プロトコルを1つ以上指定してください",
            ));
        }

        let rtlamr_single_mode = x.boolean(Field::RtlamrSingleMode)?;

        // METER_UPDATE_PERIOD
        let meter_update_period = x.integer(Field::MeterUpdatePeriod).and_then(|n| {
            u64::try_from(n)
                .ok()
                .and_then(NonZeroU64::new)
                .ok_or_else(|| {
                    ConfigError::constraint(
                        Field::MeterUpdatePeriod,
                        format!("1秒以上を指定してください。値: {n}"),
                    )
                })
        })?;

        let rtlamr_low_cpu = x.boolean(Field::RtlamrLowCpu)?;
        let gallons_multiplier = x.positive_decimal(Field::GallonsMultiplier)?;
        let wh_multiplier = x.positive_decimal(Field::WhMultiplier)?;

        // READINGS_PER_HOUR
        let readings_per_hour = x.integer(Field::ReadingsPerHour).and_then(|n| {
            u32::try_from(n)
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or_else(|| {
                    ConfigError::constraint(
                        Field::ReadingsPerHour,
                        format!("1以上を指定してください。値: {n}"),
                    )
                })
        })?;

        // MQTT_HOST
        let mqtt_host = x.string(Field::MqttHost)?;
        if mqtt_host.is_empty() || mqtt_host.contains(char::is_whitespace) {
            return Err(ConfigError::constraint(
                Field::MqttHost,
                format!(r#""{mqtt_host}" はホスト名でもアドレスでもありません"#),
            ));
        }

        // MQTT_PORT
        let mqtt_port = x.integer(Field::MqttPort).and_then(|n| {
            u16::try_from(n)
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| {
                    ConfigError::constraint(
                        Field::MqttPort,
                        format!("{n} は範囲(1-65535)外です"),
                    )
                })
        })?;

        // MQTT_USER, MQTT_PASSWORD
        let mqtt_user = x.string(Field::MqttUser)?;
        let mqtt_password = x.string(Field::MqttPassword)?;
        if mqtt_user.is_empty() && !mqtt_password.is_empty() {
            return Err(ConfigError::constraint(
                Field::MqttUser,
                "MQTT_PASSWORD を指定するときは必須です",
            ));
        }

        let rtlamr = x.path(Field::Rtlamr)?;
        let rtl_tcp = x.path(Field::RtlTcp)?;

        let settings = Settings {
            watched_meters,
            msgtype,
            rtlamr_single_mode,
            meter_update_period,
            rtlamr_low_cpu,
            gallons_multiplier,
            wh_multiplier,
            readings_per_hour,
            mqtt_host: mqtt_host.to_owned(),
            mqtt_port,
            mqtt_user: mqtt_user.to_owned(),
            mqtt_password: mqtt_password.to_owned(),
            rtlamr,
            rtl_tcp,
        };
        if settings.rtlamr_low_cpu && !settings.rtlamr_single_mode {
            tracing::info!("RTLAMR_LOW_CPU is set, rtlamr runs in single mode");
        }
        Ok(settings)
    }
}

#[cfg(test)]
use crate::settings::ConfigErrorKind;
#[cfg(test)]
use rust_decimal::dec;

#[cfg(test)]
pub(crate) const EXAMPLE: &str = include_str!("../settings.sample.py");

// 設定ファイルの KEY の行を書き換える
#[cfg(test)]
pub(crate) fn replace_setting(source: &str, key: &str, line: &str) -> String {
    source
        .lines()
        .map(|l| {
            if l.starts_with(&format!("{key} ")) || l.starts_with(&format!("{key}=")) {
                line
            } else {
                l
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub(crate) fn example_with(key: &str, line: &str) -> String {
    replace_setting(EXAMPLE, key, line)
}

#[cfg(test)]
fn kind_and_field(source: &str) -> (ConfigErrorKind, Option<Field>) {
    match Settings::from_str(source) {
        Ok(s) => panic!("unexpectedly accepted {s:?}"),
        Err(e) => (e.kind(), e.field()),
    }
}

#[test]
fn test1() {
    let settings = Settings::from_str(EXAMPLE).unwrap();
    assert_eq!(settings.mqtt_port(), 1883);
    assert!(settings.watched_meters().is_empty());
    assert!(settings.watches_all_meters());
    assert_eq!(
        settings.msgtype().iter().copied().collect::<Vec<_>>(),
        vec![MsgType::R900]
    );
    assert!(settings.rtlamr_single_mode());
    assert!(settings.single_mode());
    assert!(!settings.rtlamr_low_cpu());
    assert_eq!(settings.meter_update_period(), Duration::from_secs(900));
    assert_eq!(settings.units().gallons_multiplier, dec!(0.10));
    assert_eq!(settings.units().wh_multiplier, Decimal::from(1000));
    assert_eq!(settings.units().readings_per_hour.get(), 12);
    assert_eq!(settings.mqtt_host(), "127.0.0.1");
    assert_eq!(settings.mqtt_credentials(), None);
    assert_eq!(settings.rtlamr_path(), Path::new("/usr/local/bin/rtlamr"));
    assert_eq!(settings.rtl_tcp_path(), Path::new("/usr/bin/rtl_tcp"));
}

#[test]
fn test2() {
    // MSGTYPE = [] は受け付けない
    let source = example_with("MSGTYPE", "MSGTYPE = []");
    assert_eq!(
        kind_and_field(&source),
        (
            ConfigErrorKind::ConstraintViolation,
            Some(Field::MsgType)
        )
    );

    let source = example_with("MSGTYPE", "MSGTYPE = ['r900', 'scm']");
    assert_eq!(
        kind_and_field(&source),
        (
            ConfigErrorKind::ConstraintViolation,
            Some(Field::MsgType)
        )
    );

    let source = example_with("MSGTYPE", "MSGTYPE = 'r900'");
    assert_eq!(
        kind_and_field(&source),
        (ConfigErrorKind::TypeInvalid, Some(Field::MsgType))
    );

    let source = example_with("MSGTYPE", "MSGTYPE = ['idm', 'r900', 'idm']");
    let settings = Settings::from_str(&source).unwrap();
    assert_eq!(
        settings.msgtype().iter().copied().collect::<Vec<_>>(),
        vec![MsgType::R900, MsgType::Idm]
    );
}

#[test]
fn test3() {
    // 低CPUモードは常にシングルモード
    let source = example_with("RTLAMR_SINGLE_MODE", "RTLAMR_SINGLE_MODE = False");
    let source = source.replace("RTLAMR_LOW_CPU = False", "RTLAMR_LOW_CPU = True");
    let settings = Settings::from_str(&source).unwrap();
    assert!(!settings.rtlamr_single_mode());
    assert!(settings.rtlamr_low_cpu());
    assert!(settings.single_mode());

    let source = example_with("RTLAMR_SINGLE_MODE", "RTLAMR_SINGLE_MODE = False");
    let settings = Settings::from_str(&source).unwrap();
    assert!(!settings.single_mode());
}

#[test]
fn test4() {
    // 0以下の倍率は受け付けない
    for value in ["0", "0.0", "-0.10", "-1"] {
        let source = example_with(
            "GALLONS_MULTIPLIER",
            &format!("GALLONS_MULTIPLIER = {value}"),
        );
        assert_eq!(
            kind_and_field(&source),
            (
                ConfigErrorKind::ConstraintViolation,
                Some(Field::GallonsMultiplier)
            ),
            "{value}"
        );
    }

    let source = example_with("WH_MULTIPLIER", "WH_MULTIPLIER = 0");
    assert_eq!(
        kind_and_field(&source),
        (
            ConfigErrorKind::ConstraintViolation,
            Some(Field::WhMultiplier)
        )
    );

    let source = example_with("WH_MULTIPLIER", "WH_MULTIPLIER = '1000'");
    assert_eq!(
        kind_and_field(&source),
        (ConfigErrorKind::TypeInvalid, Some(Field::WhMultiplier))
    );

    let source = example_with("WH_MULTIPLIER", "WH_MULTIPLIER = 10.5");
    let settings = Settings::from_str(&source).unwrap();
    assert_eq!(settings.units().wh_multiplier, dec!(10.5));
}

#[test]
fn test5() {
    let source = example_with("MQTT_PORT", "MQTT_PORT = '1883'");
    assert_eq!(
        kind_and_field(&source),
        (ConfigErrorKind::TypeInvalid, Some(Field::MqttPort))
    );

    for value in ["0", "70000", "-1"] {
        let source = example_with("MQTT_PORT", &format!("MQTT_PORT = {value}"));
        assert_eq!(
            kind_and_field(&source),
            (
                ConfigErrorKind::ConstraintViolation,
                Some(Field::MqttPort)
            )
        );
    }

    let source = example_with("MQTT_HOST", "MQTT_HOST = ''");
    assert_eq!(
        kind_and_field(&source),
        (
            ConfigErrorKind::ConstraintViolation,
            Some(Field::MqttHost)
        )
    );

    let source = example_with("MQTT_PORT", "MQTT_PORT = 65535");
    assert_eq!(Settings::from_str(&source).unwrap().mqtt_port(), 65535);
}

#[test]
fn test6() {
    // ユーザー名だけ
    let source = example_with("MQTT_USER", "MQTT_USER = 'meter'");
    let settings = Settings::from_str(&source).unwrap();
    assert_eq!(
        settings.mqtt_credentials(),
        Some(MqttCredentials {
            user: "meter",
            password: ""
        })
    );

    // ユーザー名とパスワード
    let source = source.replace("MQTT_PASSWORD = ''", "MQTT_PASSWORD = 'secret'");
    let settings = Settings::from_str(&source).unwrap();
    let credentials = settings.mqtt_credentials().unwrap();
    assert_eq!(credentials.password, "secret");
    assert_eq!(
        format!("{credentials:?}"),
        "MqttCredentials { user: \"meter\", password: \"######\" }"
    );
    assert!(!format!("{settings:?}").contains("secret"));

    // パスワードだけ
    let source = example_with("MQTT_PASSWORD", "MQTT_PASSWORD = 'secret'");
    assert_eq!(
        kind_and_field(&source),
        (
            ConfigErrorKind::ConstraintViolation,
            Some(Field::MqttUser)
        )
    );
}

#[test]
fn test7() {
    let source = example_with("WATCHED_METERS", "WATCHED_METERS = [8675309, 123456789, 8675309]");
    let settings = Settings::from_str(&source).unwrap();
    assert_eq!(
        settings.watched_meters().iter().copied().collect::<Vec<_>>(),
        vec![MeterId(8675309), MeterId(123456789)]
    );
    assert!(!settings.watches_all_meters());

    let source = example_with("WATCHED_METERS", "WATCHED_METERS = [-1]");
    assert_eq!(
        kind_and_field(&source),
        (
            ConfigErrorKind::ConstraintViolation,
            Some(Field::WatchedMeters)
        )
    );

    let source = example_with("WATCHED_METERS", "WATCHED_METERS = ['8675309']");
    assert_eq!(
        kind_and_field(&source),
        (
            ConfigErrorKind::TypeInvalid,
            Some(Field::WatchedMeters)
        )
    );
}

#[test]
fn test8() {
    // 項目が足りない
    let source = example_with("RTL_TCP", "#RTL_TCP = '/usr/bin/rtl_tcp'");
    assert_eq!(
        kind_and_field(&source),
        (ConfigErrorKind::MissingField, Some(Field::RtlTcp))
    );

    for (key, line) in [
        ("METER_UPDATE_PERIOD", "METER_UPDATE_PERIOD = 0"),
        ("READINGS_PER_HOUR", "READINGS_PER_HOUR = -12"),
    ] {
        let source = example_with(key, line);
        let (kind, field) = kind_and_field(&source);
        assert_eq!(kind, ConfigErrorKind::ConstraintViolation);
        assert_eq!(field.map(|f| f.key()), Some(key));
    }

    for (key, line) in [
        ("RTLAMR_SINGLE_MODE", "RTLAMR_SINGLE_MODE = 1"),
        ("METER_UPDATE_PERIOD", "METER_UPDATE_PERIOD = 900.0"),
        ("READINGS_PER_HOUR", "READINGS_PER_HOUR = True"),
        ("RTLAMR", "RTLAMR = None"),
    ] {
        let source = example_with(key, line);
        let (kind, field) = kind_and_field(&source);
        assert_eq!(kind, ConfigErrorKind::TypeInvalid);
        assert_eq!(field.map(|f| f.key()), Some(key));
    }

    let source = example_with("RTLAMR", "RTLAMR = ''");
    assert_eq!(
        kind_and_field(&source),
        (
            ConfigErrorKind::ConstraintViolation,
            Some(Field::Rtlamr)
        )
    );
}

#[test]
fn test9() {
    // 知らないキーは無視する
    let source = format!("{EXAMPLE}\nMQTT_TOPIC = 'readings'\n");
    assert!(Settings::from_str(&source).is_ok());

    // 文法エラー
    let source = example_with("MQTT_PORT", "MQTT_PORT = 18 83");
    assert_eq!(kind_and_field(&source).0, ConfigErrorKind::Syntax);

    // 要素の無いリストにカンマは置けない
    let source = example_with("MSGTYPE", "MSGTYPE = [,]");
    assert_eq!(kind_and_field(&source).0, ConfigErrorKind::Syntax);
}

#[test]
fn test10() {
    let source = r#"
WATCHED_METERS = []
MSGTYPE = ["r900"]
RTLAMR_SINGLE_MODE = true
METER_UPDATE_PERIOD = 900
RTLAMR_LOW_CPU = false
GALLONS_MULTIPLIER = 0.5
WH_MULTIPLIER = 1000
READINGS_PER_HOUR = 12
MQTT_HOST = "127.0.0.1"
MQTT_PORT = 1883
MQTT_USER = ""
MQTT_PASSWORD = ""
RTLAMR = "/usr/local/bin/rtlamr"
RTL_TCP = "/usr/bin/rtl_tcp"
"#;
    let from_toml = Settings::from_toml_str(source).unwrap();
    let from_python = Settings::from_str(&example_with(
        "GALLONS_MULTIPLIER",
        "GALLONS_MULTIPLIER = 0.5",
    ))
    .unwrap();
    assert_eq!(from_toml, from_python);
}

#[test]
fn test11() {
    let settings = Settings::from_str(EXAMPLE).unwrap();
    let toml = toml::to_string_pretty(&settings).unwrap();
    assert!(toml.contains("MQTT_PORT = 1883"));
    assert!(toml.contains("WATCHED_METERS = []"));
    assert!(toml.contains("GALLONS_MULTIPLIER = 0.1"));
    // 書き出したTOMLはそのまま読み込める
    assert_eq!(Settings::from_toml_str(&toml).unwrap(), settings);

    let source = example_with("MQTT_USER", "MQTT_USER = 'meter'")
        .replace("MQTT_PASSWORD = ''", "MQTT_PASSWORD = 'secret'");
    let settings = Settings::from_str(&source).unwrap();
    let json = serde_json::to_value(&settings).unwrap();
    assert_eq!(json["MQTT_PASSWORD"], "######");
    assert_eq!(json["MSGTYPE"], serde_json::json!(["r900"]));
}

#[test]
fn test12() {
    let dir = std::env::temp_dir().join(format!("uchinometer-load-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let py = dir.join("settings.py");
    fs::write(&py, EXAMPLE).unwrap();
    let from_py = Settings::load(&py).unwrap();
    assert_eq!(from_py.mqtt_port(), 1883);

    let toml = dir.join("settings.toml");
    fs::write(&toml, toml::to_string(&from_py).unwrap()).unwrap();
    assert_eq!(Settings::load(&toml).unwrap(), from_py);

    let e = Settings::load(dir.join("missing.py")).unwrap_err();
    assert_eq!(e.kind(), ConfigErrorKind::Io);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test13() {
    // Decimalで表せない倍率は範囲外
    for value in ["1e30", "1e-30", "0.0000000000000000000000000000001"] {
        let source = example_with(
            "GALLONS_MULTIPLIER",
            &format!("GALLONS_MULTIPLIER = {value}"),
        );
        let e = Settings::from_str(&source).unwrap_err();
        assert_eq!(e.kind(), ConfigErrorKind::ConstraintViolation, "{value}");
        assert_eq!(e.field(), Some(Field::GallonsMultiplier));
        assert!(e.to_string().contains("範囲外"), "{e}");
    }

    let source = example_with("GALLONS_MULTIPLIER", "GALLONS_MULTIPLIER = .5");
    let settings = Settings::from_str(&source).unwrap();
    assert_eq!(settings.units().gallons_multiplier, dec!(0.5));

    let source = example_with("WH_MULTIPLIER", "WH_MULTIPLIER = 1.5e3");
    let settings = Settings::from_str(&source).unwrap();
    assert_eq!(settings.units().wh_multiplier, dec!(1500));

    // TOMLでも同じ
    let toml = toml::to_string(&Settings::from_str(EXAMPLE).unwrap()).unwrap();
    let toml = replace_setting(&toml, "GALLONS_MULTIPLIER", "GALLONS_MULTIPLIER = 1e-30");
    let e = Settings::from_toml_str(&toml).unwrap_err();
    assert_eq!(e.kind(), ConfigErrorKind::ConstraintViolation);
    assert_eq!(e.field(), Some(Field::GallonsMultiplier));
    assert!(e.to_string().contains("範囲外"), "{e}");
    assert!(!e.to_string().contains("値: 0"), "{e}");
}

#[test]
fn test14() {
    // パスワードはエラーメッセージに出さない
    let source = example_with("MQTT_USER", "MQTT_USER = 'meter'");

    let e = Settings::from_str(&replace_setting(
        &source,
        "MQTT_PASSWORD",
        "MQTT_PASSWORD = 123456",
    ))
    .unwrap_err();
    assert_eq!(e.kind(), ConfigErrorKind::TypeInvalid);
    assert_eq!(e.field(), Some(Field::MqttPassword));
    assert!(!e.to_string().contains("123456"), "{e}");
    assert!(e.to_string().ends_with("int ######"), "{e}");

    let e = Settings::from_str(&replace_setting(
        &source,
        "MQTT_PASSWORD",
        "MQTT_PASSWORD = 'hunter2",
    ))
    .unwrap_err();
    assert_eq!(e.kind(), ConfigErrorKind::Syntax);
    assert!(!e.to_string().contains("hunter2"), "{e}");

    // シリアライズしても隠す
    let credentials = MqttCredentials {
        user: "meter",
        password: "hunter2",
    };
    assert_eq!(
        serde_json::to_value(&credentials).unwrap(),
        serde_json::json!({"user": "meter", "password": "#######"})
    );
}
