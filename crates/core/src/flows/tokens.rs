//! Fixed zh-TW surface tokens recognised by the dialog engine.

pub const BACK: &str = "返回上一階段";
pub const BACK_SHORT: &str = "返回";
pub const NONE: &str = "無";
pub const NO_NOTE: &str = "無備註";

pub const START_BOOKING: &str = "我要預約";
pub const INQUIRE_PRICE: &str = "查詢價格";
pub const CHANGE_BOOKING: &str = "更改預約";
pub const REQUEST_AGENT: &str = "真人客服";

/// Sent from the price-inquiry result to continue into a booking.
pub const BOOK_THIS: &str = "我要預約";

pub const SUBMIT_POSTBACK: &str = "CONFIRM_BOOKING";
pub const SUBMIT_TEXT: &str = "確認送出";
pub const DIFFERENCE_POSTBACK_PREFIX: &str = "DIFF:";

pub const OPTION_REFILL: &str = "重新填寫預約單";
pub const OPTION_MODIFY_SCHEDULE: &str = "修改日期時段";
pub const OPTION_CANCEL: &str = "取消預約";

pub fn is_back(text: &str) -> bool {
    matches!(text.trim(), BACK | BACK_SHORT)
}
