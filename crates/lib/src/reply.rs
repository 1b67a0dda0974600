//! Keyword auto-reply: map an inbound message to a canned reply and send it.
//!
//! Rules are evaluated in table order against the lowercased, trimmed text; the first
//! match wins and the fallback answers everything else.

use crate::channels::{ChannelHandle, InboundMessage, SendError};
use regex::Regex;
use std::sync::LazyLock;

pub const GREETING_REPLY: &str = "Hello! Welcome to Nasi Kandar. How can I help you today?\n\n\
1. View Menu\n\
2. Order Now\n\
3. Check Status\n\
4. Contact Support";

pub const MENU_REPLY: &str = "🍽️ *Our Menu*\n\n\
1. Nasi Kandar Special - RM12\n\
2. Ayam Goreng - RM8\n\
3. Ikan Goreng - RM10\n\
4. Sotong Goreng - RM9\n\
5. Daging Kari - RM15\n\n\
Reply with the item number to order!";

pub const ORDER_REPLY: &str = "Great! To place your order, please provide:\n\n\
📍 Your delivery address\n\
📞 Contact number\n\
🕒 Preferred delivery time\n\n\
Or call us at: +60 12-345-6789";

pub const STATUS_REPLY: &str = "To check your order status, please provide your order number.\n\n\
Format: ORDER-XXXXX";

pub const HOURS_REPLY: &str = "🕐 *Opening Hours*\n\n\
Monday - Sunday: 11:00 AM - 11:00 PM\n\n\
We are open every day!";

pub const LOCATION_REPLY: &str = "📍 *Our Location*\n\n\
Nasi Kandar Restaurant\n\
Jalan Penang, Georgetown\n\
Pulau Pinang, Malaysia\n\n\
Google Maps: [Add your link here]";

pub const PRICE_REPLY: &str = "Our prices range from RM8 to RM15 per dish.\n\n\
Type \"menu\" to see the full menu with prices.";

pub const DELIVERY_REPLY: &str = "🚚 *Delivery Information*\n\n\
• Delivery Fee: RM5 (within 5km)\n\
• Delivery Time: 30-45 minutes\n\
• Minimum Order: RM20\n\n\
Ready to order? Type \"order\" to proceed!";

pub const THANKS_REPLY: &str = "You're welcome! Have a great day! 😊\n\n\
Feel free to message us anytime.";

pub const FALLBACK_REPLY: &str = "Thank you for your message! 🙏\n\n\
I can help you with:\n\
• Menu and Prices\n\
• Place Orders\n\
• Delivery Information\n\
• Opening Hours\n\
• Location\n\n\
Just type what you need (e.g., \"menu\", \"order\", \"delivery\")";

/// Which rule produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Greeting,
    Menu,
    Order,
    Status,
    Hours,
    Location,
    Price,
    Delivery,
    Thanks,
    Fallback,
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Rule::Greeting => "greeting",
            Rule::Menu => "menu",
            Rule::Order => "order",
            Rule::Status => "status",
            Rule::Hours => "hours",
            Rule::Location => "location",
            Rule::Price => "price",
            Rule::Delivery => "delivery",
            Rule::Thanks => "thanks",
            Rule::Fallback => "fallback",
        }
    }

    pub fn reply(self) -> &'static str {
        match self {
            Rule::Greeting => GREETING_REPLY,
            Rule::Menu => MENU_REPLY,
            Rule::Order => ORDER_REPLY,
            Rule::Status => STATUS_REPLY,
            Rule::Hours => HOURS_REPLY,
            Rule::Location => LOCATION_REPLY,
            Rule::Price => PRICE_REPLY,
            Rule::Delivery => DELIVERY_REPLY,
            Rule::Thanks => THANKS_REPLY,
            Rule::Fallback => FALLBACK_REPLY,
        }
    }
}

/// A standalone menu item number. ASCII word boundaries, so "a3" and "10" do not count;
/// digits above 5 never match.
static ITEM_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)[1-5](?-u:\b)").expect("item number regex"));

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn is_greeting(t: &str) -> bool {
    contains_any(t, &["hello", "hi", "hey"])
}

fn is_menu(t: &str) -> bool {
    t.contains("menu")
}

fn is_order(t: &str) -> bool {
    t.contains("order") || ITEM_NUMBER.is_match(t)
}

fn is_status(t: &str) -> bool {
    t.contains("status")
}

fn is_hours(t: &str) -> bool {
    contains_any(t, &["hours", "open"])
}

fn is_location(t: &str) -> bool {
    contains_any(t, &["location", "address"])
}

fn is_price(t: &str) -> bool {
    contains_any(t, &["price", "cost"])
}

fn is_delivery(t: &str) -> bool {
    t.contains("delivery")
}

fn is_thanks(t: &str) -> bool {
    t.contains("thank")
}

/// Ordered rule table; evaluated top to bottom on normalized text.
pub const RULES: &[(Rule, fn(&str) -> bool)] = &[
    (Rule::Greeting, is_greeting),
    (Rule::Menu, is_menu),
    (Rule::Order, is_order),
    (Rule::Status, is_status),
    (Rule::Hours, is_hours),
    (Rule::Location, is_location),
    (Rule::Price, is_price),
    (Rule::Delivery, is_delivery),
    (Rule::Thanks, is_thanks),
];

/// Lowercase and trim.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// First matching rule for the message text, or [`Rule::Fallback`].
pub fn match_rule(text: &str) -> Rule {
    let t = normalize(text);
    RULES
        .iter()
        .find(|(_, matches)| matches(&t))
        .map(|(rule, _)| *rule)
        .unwrap_or(Rule::Fallback)
}

/// Canned reply for the message text.
pub fn reply_for(text: &str) -> &'static str {
    match_rule(text).reply()
}

/// Answer one inbound message: pick the reply and send it back to the sender once.
pub async fn handle_incoming_message(
    channel: &dyn ChannelHandle,
    msg: &InboundMessage,
) -> Result<serde_json::Value, SendError> {
    let rule = match_rule(&msg.body);
    log::debug!(
        "{}: message {} from {} matched rule {}",
        channel.id(),
        msg.id,
        msg.from,
        rule.name()
    );
    channel.send_message(&msg.from, rule.reply()).await
}
