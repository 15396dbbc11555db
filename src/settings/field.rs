// 設定項目名
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use std::fmt;

/// 設定項目
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    WatchedMeters,
    MsgType,
    RtlamrSingleMode,
    MeterUpdatePeriod,
    RtlamrLowCpu,
    GallonsMultiplier,
    WhMultiplier,
    ReadingsPerHour,
    MqttHost,
    MqttPort,
    MqttUser,
    MqttPassword,
    Rtlamr,
    RtlTcp,
}

impl Field {
    /// 全設定項目(設定ファイルでの記述順)
    pub const ALL: [Field; 14] = [
        Field::WatchedMeters,
        Field::MsgType,
        Field::RtlamrSingleMode,
        Field::MeterUpdatePeriod,
        Field::RtlamrLowCpu,
        Field::GallonsMultiplier,
        Field::WhMultiplier,
        Field::ReadingsPerHour,
        Field::MqttHost,
        Field::MqttPort,
        Field::MqttUser,
        Field::MqttPassword,
        Field::Rtlamr,
        Field::RtlTcp,
    ];

    /// 設定ファイル上のキー名
    pub const fn key(&self) -> &'static str {
        match self {
            Field::WatchedMeters => "WATCHED_METERS",
            Field::MsgType => "MSGTYPE",
            Field::RtlamrSingleMode => "RTLAMR_SINGLE_MODE",
            Field::MeterUpdatePeriod => "METER_UPDATE_PERIOD",
            Field::RtlamrLowCpu => "RTLAMR_LOW_CPU",
            Field::GallonsMultiplier => "GALLONS_MULTIPLIER",
            Field::WhMultiplier => "WH_MULTIPLIER",
            Field::ReadingsPerHour => "READINGS_PER_HOUR",
            Field::MqttHost => "MQTT_HOST",
            Field::MqttPort => "MQTT_PORT",
            Field::MqttUser => "MQTT_USER",
            Field::MqttPassword => "MQTT_PASSWORD",
            Field::Rtlamr => "RTLAMR",
            Field::RtlTcp => "RTL_TCP",
        }
    }

    /// ログやエラーメッセージに値を出さない設定項目
    pub const fn is_secret(&self) -> bool {
        matches!(self, Field::MqttPassword)
    }

    /// キー名から設定項目を得る
    pub fn from_key(key: &str) -> Option<Field> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[test]
fn test1() {
    for field in Field::ALL {
        assert_eq!(Field::from_key(field.key()), Some(field));
    }
    assert_eq!(Field::from_key("MQTT_PORT"), Some(Field::MqttPort));
    assert_eq!(Field::from_key("mqtt_port"), None);
    assert_eq!(Field::RtlTcp.to_string(), "RTL_TCP");
    assert!(Field::MqttPassword.is_secret());
    assert!(!Field::MqttUser.is_secret());
}
