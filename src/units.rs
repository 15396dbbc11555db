// メーター読み取り値の単位換算
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use rust_decimal::Decimal;
use std::fmt;
use std::num::NonZeroU32;

/// 単位換算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConversion {
    pub gallons_multiplier: Decimal, // 読み取り値 → ガロン(gal)
    pub wh_multiplier: Decimal,      // 読み取り値 → ワット時(Wh)
    pub readings_per_hour: NonZeroU32, // 1時間あたりのIDM区間数
}

impl UnitConversion {
    /// 水道メーターの読み取り値をガロンにする
    pub fn gallons(&self, reading: u64) -> Decimal {
        Decimal::from(reading) * self.gallons_multiplier
    }

    /// 電力量計の読み取り値をワット時にする
    pub fn watt_hours(&self, reading: u64) -> Decimal {
        Decimal::from(reading) * self.wh_multiplier
    }

    /// IDM 1区間の消費量から区間の平均電力(W)を求める
    pub fn interval_watts(&self, interval_reading: u64) -> Decimal {
        self.watt_hours(interval_reading) * Decimal::from(self.readings_per_hour.get())
    }

    /// IDM 1区間の長さ(分)
    pub fn interval_minutes(&self) -> Decimal {
        Decimal::from(60) / Decimal::from(self.readings_per_hour.get())
    }
}

impl fmt::Display for UnitConversion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "×{} gal, ×{} Wh, {} readings/h",
            self.gallons_multiplier, self.wh_multiplier, self.readings_per_hour
        )
    }
}

#[cfg(test)]
use rust_decimal::dec;

#[cfg(test)]
fn example() -> UnitConversion {
    UnitConversion {
        gallons_multiplier: dec!(0.10),
        wh_multiplier: dec!(1000),
        readings_per_hour: NonZeroU32::new(12).unwrap(),
    }
}

#[test]
fn test1() {
    let units = example();
    assert_eq!(units.gallons(123456), dec!(12345.6));
    assert_eq!(units.watt_hours(42), dec!(42000));
    assert_eq!(units.gallons(0), Decimal::ZERO);
}

#[test]
fn test2() {
    let units = example();
    // 5分間に 0.1kWh なら平均 1.2kW
    let units = UnitConversion {
        wh_multiplier: dec!(10),
        ..units
    };
    assert_eq!(units.interval_watts(10), dec!(1200));
    assert_eq!(units.interval_minutes(), dec!(5));

    let quarter = UnitConversion {
        readings_per_hour: NonZeroU32::new(4).unwrap(),
        ..units
    };
    assert_eq!(quarter.interval_minutes(), dec!(15));
}
