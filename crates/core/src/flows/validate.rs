use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::catalog::VehicleClass;
use crate::domain::booking::TimeSlot;
use crate::flows::tokens;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern is valid")
});

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6,}$").expect("phone pattern is valid"));

/// Input rejected at the current step. The display text is shown to the user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("請從選單中選擇服務類別。")]
    UnknownCategory,
    #[error("請從選單中選擇服務項目。")]
    UnknownSubService,
    #[error("請從選項中選擇車型。")]
    UnknownVehicle,
    #[error("日期格式不正確，請以 YYYY-MM-DD 格式輸入。")]
    InvalidDate,
    #[error("請選擇預約時段（早上/下午/晚上）。")]
    InvalidTimeSlot,
    #[error("電話格式不正確，請輸入至少 6 位數字。")]
    InvalidPhone,
    #[error("目前步驟不需要傳送位置，請依提示輸入。")]
    UnexpectedLocation,
    #[error("請按下「確認送出」完成預約，或返回上一階段修改。")]
    ExpectedSubmit,
    #[error("如需預約此服務，請點選「我要預約」。")]
    ExpectedBookThis,
    #[error("請從選項中選擇要執行的動作。")]
    UnknownOption,
}

/// Accepts `YYYY-MM-DD` shaped text. Calendar validity is not checked.
pub fn date(text: &str) -> Result<String, InputError> {
    let text = text.trim();
    if DATE_PATTERN.is_match(text) {
        Ok(text.to_string())
    } else {
        Err(InputError::InvalidDate)
    }
}

pub fn time_slot(text: &str) -> Result<TimeSlot, InputError> {
    TimeSlot::from_label(text.trim()).ok_or(InputError::InvalidTimeSlot)
}

pub fn vehicle(text: &str) -> Result<VehicleClass, InputError> {
    VehicleClass::from_label(text.trim()).ok_or(InputError::UnknownVehicle)
}

/// Drops whitespace and hyphens so `0912-345 678` and `0912345678` compare equal.
pub fn strip_phone_separators(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace() && *c != '-').collect()
}

pub fn phone(text: &str) -> Result<String, InputError> {
    let digits = strip_phone_separators(text);
    if PHONE_PATTERN.is_match(&digits) {
        Ok(digits)
    } else {
        Err(InputError::InvalidPhone)
    }
}

/// Optional free-text field: the none token becomes an empty value.
pub fn optional(text: &str) -> String {
    match text.trim() {
        tokens::NONE => String::new(),
        other => other.to_string(),
    }
}

pub fn note(text: &str) -> String {
    match text.trim() {
        tokens::NONE | tokens::NO_NOTE => String::new(),
        other => other.to_string(),
    }
}
