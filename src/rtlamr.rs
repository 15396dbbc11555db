// rtlamr, rtl_tcp の起動情報
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::meter_settings::Settings;
use crate::settings::{ConfigError, Field};
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

/// 低CPUモードの中心周波数(Hz)
pub const LOW_CPU_CENTER_FREQ: u32 = 912_000_000;

/// 低CPUモードのシンボル長
pub const LOW_CPU_SYMBOL_LENGTH: u32 = 8;

impl Settings {
    /// rtlamr のコマンドライン引数
    pub fn rtlamr_args(&self) -> Vec<String> {
        let msgtype = self
            .msgtype()
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>();
        let mut args = vec![format!("-msgtype={}", msgtype.join(",")), "-format=csv".to_owned()];
        // 空なら全メーター
        if !self.watches_all_meters() {
            let ids = self
                .watched_meters()
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>();
            args.push(format!("-filterid={}", ids.join(",")));
        }
        if self.single_mode() {
            args.push("-single=true".to_owned());
        }
        if self.rtlamr_low_cpu() {
            args.push(format!("-centerfreq={LOW_CPU_CENTER_FREQ}"));
            args.push(format!("-symbollength={LOW_CPU_SYMBOL_LENGTH}"));
        }
        args
    }

    /// rtlamr の起動コマンド(起動はしない)
    pub fn rtlamr_command(&self) -> Command {
        let mut command = Command::new(self.rtlamr_path());
        command.args(self.rtlamr_args());
        command
    }

    /// RTLAMR, RTL_TCP が実行可能ファイルか確かめる
    pub fn verify_executables(&self) -> Result<(), ConfigError> {
        verify_executable(Field::Rtlamr, self.rtlamr_path())?;
        verify_executable(Field::RtlTcp, self.rtl_tcp_path())
    }
}

/// 実行可能ファイルか確かめる
pub fn verify_executable(field: Field, path: &Path) -> Result<(), ConfigError> {
    let metadata = fs::metadata(path).map_err(|e| {
        let reason = match e.kind() {
            io::ErrorKind::NotFound => format!(r#""{}" が見つかりません"#, path.display()),
            _ => format!(r#""{}" にアクセスできません: {e}"#, path.display()),
        };
        ConfigError::constraint(field, reason)
    })?;

    if !metadata.is_file() {
        return Err(ConfigError::constraint(
            field,
            format!(r#""{}" は通常のファイルではありません"#, path.display()),
        ));
    }
    if !is_executable(&metadata) {
        return Err(ConfigError::constraint(
            field,
            format!(r#""{}" は実行可能ではありません"#, path.display()),
        ));
    }
    tracing::debug!(r#"{field} "{}" is executable"#, path.display());
    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

#[cfg(test)]
use crate::meter_settings::{EXAMPLE, example_with, replace_setting};
#[cfg(test)]
use std::str::FromStr;

#[test]
fn test1() {
    let settings = Settings::from_str(EXAMPLE).unwrap();
    assert_eq!(
        settings.rtlamr_args(),
        vec!["-msgtype=r900", "-format=csv", "-single=true"]
    );

    let source = example_with("MSGTYPE", "MSGTYPE = ['idm', 'r900']")
        .replace("RTLAMR_SINGLE_MODE = True", "RTLAMR_SINGLE_MODE = False");
    let source = replace_setting(&source, "WATCHED_METERS", "WATCHED_METERS = [98765432, 12345678]");
    let settings = Settings::from_str(&source).unwrap();
    assert_eq!(
        settings.rtlamr_args(),
        vec![
            "-msgtype=r900,idm",
            "-format=csv",
            "-filterid=12345678,98765432"
        ]
    );
}

#[test]
fn test2() {
    // 低CPUモード
    let source = example_with("RTLAMR_LOW_CPU", "RTLAMR_LOW_CPU = True")
        .replace("RTLAMR_SINGLE_MODE = True", "RTLAMR_SINGLE_MODE = False");
    let settings = Settings::from_str(&source).unwrap();
    assert_eq!(
        settings.rtlamr_args(),
        vec![
            "-msgtype=r900",
            "-format=csv",
            "-single=true",
            "-centerfreq=912000000",
            "-symbollength=8"
        ]
    );

    let command = settings.rtlamr_command();
    assert_eq!(command.get_program(), "/usr/local/bin/rtlamr");
    assert_eq!(command.get_args().count(), 5);
}

#[test]
fn test3() {
    let missing = Path::new("/nonexistent/uchinometer/rtlamr");
    let e = verify_executable(Field::Rtlamr, missing).unwrap_err();
    assert_eq!(e.field(), Some(Field::Rtlamr));
    assert_eq!(e.kind(), crate::settings::ConfigErrorKind::ConstraintViolation);

    // ディレクトリは実行可能ファイルではない
    let e = verify_executable(Field::RtlTcp, &std::env::temp_dir()).unwrap_err();
    assert_eq!(e.field(), Some(Field::RtlTcp));
}

#[cfg(unix)]
#[test]
fn test4() {
    use std::os::unix::fs::PermissionsExt;

    let dir = std::env::temp_dir().join(format!("uchinometer-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let program = dir.join("rtlamr");
    fs::write(&program, "#!/bin/sh\n").unwrap();

    fs::set_permissions(&program, fs::Permissions::from_mode(0o644)).unwrap();
    let e = verify_executable(Field::Rtlamr, &program).unwrap_err();
    assert!(e.to_string().ends_with("は実行可能ではありません"));

    fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
    assert!(verify_executable(Field::Rtlamr, &program).is_ok());

    let source = example_with("RTLAMR", &format!("RTLAMR = '{}'", program.display()));
    let source = replace_setting(&source, "RTL_TCP", &format!("RTL_TCP = '{}'", program.display()));
    let settings = Settings::from_str(&source).unwrap();
    assert!(settings.verify_executables().is_ok());

    fs::remove_dir_all(&dir).unwrap();
}
