//! Prompt builders for each dialog step.

use crate::catalog::{Category, Price, ServiceCatalog, VehicleClass};
use crate::domain::booking::{Booking, TimeSlot};
use crate::domain::memory::UserMemory;
use crate::flows::effects::{
    Menu, Prompt, PromptDetail, SuggestedReply, SummaryRow, VehicleChoice,
};
use crate::flows::input::TopLevelCommand;
use crate::flows::tokens;
use crate::pricing::ServiceSelection;

pub const WELCOME: &str = "歡迎使用汽車美容預約系統，請選擇服務：";
pub const UNRECOGNIZED: &str = "很抱歉，我無法辨識您的輸入。\n請從以下選單選擇服務：";
pub const ANYTHING_ELSE: &str = "請問還需要其他服務嗎？";
pub const BOOKING_NOT_FOUND: &str = "查無此電話的預約紀錄，請確認電話輸入正確。";
pub const BOOKING_CANCELLED: &str = "您的預約已取消。";
pub const HANDOFF: &str = "已為您轉接真人客服，請稍候，專人將盡快回覆您。";
pub const FAILURE: &str = "發生錯誤，請稍後再試。";

fn back() -> SuggestedReply {
    SuggestedReply::message(tokens::BACK, tokens::BACK)
}

fn back_labelled(label: &str) -> SuggestedReply {
    SuggestedReply::message(label, tokens::BACK)
}

fn time_slot_replies() -> impl Iterator<Item = SuggestedReply> {
    TimeSlot::ALL.into_iter().map(|slot| SuggestedReply::echo(slot.label()))
}

pub fn main_menu(notice: Option<&str>) -> Menu {
    Menu {
        notice: notice.map(str::to_string),
        commands: TopLevelCommand::ALL
            .into_iter()
            .map(|command| SuggestedReply::echo(command.label()))
            .collect(),
    }
}

fn category_with_text(catalog: &ServiceCatalog, text: &str) -> Prompt {
    Prompt::new(text)
        .with_replies(catalog.category_names().map(SuggestedReply::echo))
        .with_reply(back_labelled("取消"))
}

pub fn category(catalog: &ServiceCatalog) -> Prompt {
    category_with_text(catalog, "請選擇服務分類：")
}

/// Category prompt opening a change-booking refill.
pub fn refill_category(catalog: &ServiceCatalog) -> Prompt {
    category_with_text(catalog, "請選擇新的服務類別：")
}

fn sub_service_replies(category: &Category) -> Vec<SuggestedReply> {
    let mut replies: Vec<SuggestedReply> =
        category.sub_services.iter().map(|sub| SuggestedReply::echo(&sub.name)).collect();
    if category.sub_services.len() > 1 {
        replies.extend(category.sub_services.iter().map(|sub| {
            SuggestedReply::postback(
                format!("{}差異", sub.name),
                format!("{}{}", tokens::DIFFERENCE_POSTBACK_PREFIX, sub.name),
                Some(format!("{}有什麼區別?", sub.name)),
            )
        }));
    }
    replies.push(back());
    replies
}

pub fn sub_service(category: &Category) -> Prompt {
    Prompt::new(format!("請選擇「{}」的服務項目：", category.name))
        .with_replies(sub_service_replies(category))
}

/// Explanation of how the sub-services of a category differ, followed by the same choices.
pub fn difference(category: &Category) -> Prompt {
    let body = match &category.difference {
        Some(text) => text.clone(),
        None => category
            .sub_services
            .iter()
            .map(|sub| sub.difference.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    };
    Prompt::new(format!("請選擇「{}」的服務項目：", category.name))
        .with_replies(sub_service_replies(category))
        .with_detail(PromptDetail::Difference {
            title: format!("{} - 差異說明", category.name),
            body,
        })
}

pub fn vehicle() -> Prompt {
    Prompt::new("請選擇您的車型：")
        .with_replies(VehicleClass::ALL.into_iter().map(|class| SuggestedReply::echo(class.label())))
        .with_reply(back())
        .with_detail(PromptDetail::VehicleChoices {
            choices: VehicleClass::ALL
                .into_iter()
                .map(|class| VehicleChoice {
                    label: class.label().to_string(),
                    example_models: class.example_models().to_string(),
                })
                .collect(),
        })
}

pub fn license_plate(memory: Option<&UserMemory>) -> Prompt {
    let mut prompt = Prompt::new("請輸入您的車牌號碼：");
    if let Some(plate) = memory.and_then(|memory| memory.license_plate.as_deref()) {
        prompt = prompt.with_reply(SuggestedReply::message(format!("沿用上次車號 {plate}"), plate));
    }
    prompt.with_reply(back())
}

fn date_with_text(text: &str) -> Prompt {
    Prompt::new(text).with_reply(back())
}

fn time_slot_with_text(text: &str) -> Prompt {
    Prompt::new(text).with_replies(time_slot_replies()).with_reply(back())
}

pub fn date() -> Prompt {
    date_with_text("請輸入預約日期 (YYYY-MM-DD)：")
}

pub fn time_slot() -> Prompt {
    time_slot_with_text("請選擇預約時段：")
}

pub fn new_date() -> Prompt {
    date_with_text("請輸入新的預約日期 (YYYY-MM-DD)：")
}

pub fn new_time_slot() -> Prompt {
    time_slot_with_text("請選擇新的預約時段：")
}

pub fn phone(memory: Option<&UserMemory>) -> Prompt {
    let mut prompt = Prompt::new("請輸入聯絡電話：");
    if let Some(phone) = memory.and_then(|memory| memory.phone.as_deref()) {
        prompt = prompt.with_reply(SuggestedReply::message(format!("沿用上次電話 {phone}"), phone));
    }
    prompt.with_reply(back())
}

pub fn pickup_location(memory: Option<&UserMemory>) -> Prompt {
    let mut prompt = Prompt::new("請輸入取車地點：").expecting_location();
    if let Some(location) = memory.and_then(|memory| memory.pickup_location.as_deref()) {
        prompt = prompt.with_reply(SuggestedReply::message("沿用上次地點", location));
    }
    prompt.with_reply(SuggestedReply::share_location("傳送目前位置")).with_reply(back())
}

pub fn note() -> Prompt {
    Prompt::new("請輸入備註（可選填，無則輸入「無」）：")
        .with_reply(SuggestedReply::echo(tokens::NO_NOTE))
        .with_reply(back())
}

fn or_none(value: &str) -> String {
    if value.is_empty() {
        tokens::NONE.to_string()
    } else {
        value.to_string()
    }
}

fn row(label: &str, value: impl Into<String>) -> SummaryRow {
    SummaryRow { label: label.to_string(), value: value.into() }
}

pub fn summary_rows(booking: &Booking) -> Vec<SummaryRow> {
    let mut rows = vec![
        row("服務項目", booking.selection().display_name()),
        row("車型", booking.vehicle.label()),
    ];
    if !booking.license_plate.is_empty() {
        rows.push(row("車牌號碼", booking.license_plate.as_str()));
    }
    rows.extend([
        row("日期", booking.date.as_str()),
        row("時段", booking.time_slot.label()),
        row("電話", booking.phone.as_str()),
        row("地點", or_none(&booking.pickup_location)),
        row("備註", or_none(&booking.note)),
    ]);
    rows
}

pub fn confirm(preview: &Booking, price: Price) -> Prompt {
    Prompt::new("請確認以下預約資訊：")
        .with_reply(SuggestedReply::postback(
            tokens::SUBMIT_TEXT,
            tokens::SUBMIT_POSTBACK,
            Some(tokens::SUBMIT_TEXT.to_string()),
        ))
        .with_reply(back())
        .with_detail(PromptDetail::BookingSummary { rows: summary_rows(preview), price })
}

pub fn price_shown(selection: &ServiceSelection, price: Price) -> Prompt {
    Prompt::new(format!(
        "{} ({}) 的價格為 ${price} 元。",
        selection.display_name(),
        selection.vehicle.label()
    ))
    .with_reply(SuggestedReply::echo(tokens::BOOK_THIS))
    .with_reply(back_labelled(tokens::BACK_SHORT))
}

pub fn change_verify() -> Prompt {
    Prompt::new("請輸入您預約時留下的聯絡電話：").with_reply(back_labelled("返回主選單"))
}

pub fn change_options() -> Prompt {
    Prompt::new("請選擇要執行的動作：")
        .with_replies(
            [tokens::OPTION_REFILL, tokens::OPTION_MODIFY_SCHEDULE, tokens::OPTION_CANCEL]
                .into_iter()
                .map(SuggestedReply::echo),
        )
        .with_reply(back())
}

pub fn rescheduled(date: &str, time_slot: TimeSlot) -> String {
    format!("您的預約已更改為 {date} {}。", time_slot.label())
}

#[cfg(test)]
mod tests {
    use super::{change_options, confirm, license_plate, main_menu, pickup_location, sub_service};
    use crate::catalog::{ServiceCatalog, VehicleClass};
    use crate::domain::booking::{Booking, TimeSlot};
    use crate::domain::identity::Identity;
    use crate::domain::memory::UserMemory;
    use crate::flows::effects::{PromptDetail, ReplyAction};

    #[test]
    fn menu_lists_every_top_level_command() {
        let menu = main_menu(Some("hi"));
        let labels: Vec<&str> = menu.commands.iter().map(|reply| reply.label.as_str()).collect();
        assert_eq!(labels, ["我要預約", "查詢價格", "更改預約", "真人客服"]);
        assert_eq!(menu.notice.as_deref(), Some("hi"));
    }

    #[test]
    fn memory_adds_shortcut_replies() {
        let memory = UserMemory {
            phone: Some("0912345678".to_string()),
            license_plate: Some("ABC-1234".to_string()),
            pickup_location: Some("台北車站".to_string()),
        };
        let plate = license_plate(Some(&memory));
        assert_eq!(plate.suggested_replies[0].label, "沿用上次車號 ABC-1234");
        assert_eq!(
            plate.suggested_replies[0].action,
            ReplyAction::Message { text: "ABC-1234".to_string() }
        );
        assert_eq!(license_plate(None).suggested_replies.len(), 1);

        let location = pickup_location(Some(&memory));
        assert!(location.expects_location);
        assert!(location.suggested_replies.iter().any(|reply| reply.action == ReplyAction::ShareLocation));
    }

    #[test]
    fn sub_service_prompt_offers_difference_postbacks() {
        let catalog = ServiceCatalog::standard();
        let category = catalog.category("拋光美容").expect("category");
        let prompt = sub_service(category);
        assert!(prompt.suggested_replies.iter().any(|reply| matches!(
            &reply.action,
            ReplyAction::Postback { data, .. } if data == "DIFF:打蠟"
        )));
        assert_eq!(change_options().suggested_replies.len(), 4);
    }

    #[test]
    fn confirm_prompt_summarises_booking_with_price() {
        let booking = Booking {
            owner: Identity::new("U1"),
            phone: "0912345678".to_string(),
            category: "清潔養護".to_string(),
            sub_service: Some("基礎洗車".to_string()),
            vehicle: VehicleClass::Small,
            license_plate: String::new(),
            date: "2025-06-01".to_string(),
            time_slot: TimeSlot::Morning,
            pickup_location: String::new(),
            note: String::new(),
        };
        let prompt = confirm(&booking, 500);
        let Some(PromptDetail::BookingSummary { rows, price }) = prompt.detail else {
            panic!("confirm prompt carries a summary");
        };
        assert_eq!(price, 500);
        assert_eq!(rows[0].value, "清潔養護 - 基礎洗車");
        assert!(rows.iter().all(|row| row.label != "車牌號碼"));
        assert_eq!(rows.last().map(|row| row.value.as_str()), Some("無"));
    }
}
