//! Public links to channel posts.

use crate::model::Channel;

const BASE_URL: &str = "https://t.me";

/// Link to a message: `https://t.me/{handle}/{id}` for public channels,
/// `https://t.me/c/{|channel id|}/{id}` otherwise.
pub fn locate(channel: &Channel, message_id: i64) -> String {
    match channel.public_handle() {
        Some(handle) => format!("{BASE_URL}/{handle}/{message_id}"),
        None => format!("{BASE_URL}/c/{}/{message_id}", channel.id.unsigned_abs()),
    }
}
