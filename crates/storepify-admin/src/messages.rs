//! One-shot user messages produced by admin operations
//!
//! Actions and views push messages into a [`MessagesContainer`]; the admin
//! handlers return them alongside the response body.

use parking_lot::Mutex;
use serde::Serialize;

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
	Debug = 10,
	Info = 20,
	Success = 25,
	Warning = 30,
	Error = 40,
}

/// A single message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
	pub level: Level,
	pub text: String,
}

impl Message {
	pub fn new(level: Level, text: impl Into<String>) -> Self {
		Self {
			level,
			text: text.into(),
		}
	}

	pub fn info(text: impl Into<String>) -> Self {
		Self::new(Level::Info, text)
	}

	pub fn success(text: impl Into<String>) -> Self {
		Self::new(Level::Success, text)
	}

	pub fn warning(text: impl Into<String>) -> Self {
		Self::new(Level::Warning, text)
	}

	pub fn error(text: impl Into<String>) -> Self {
		Self::new(Level::Error, text)
	}
}

/// Messages collected while handling one request
#[derive(Debug, Default)]
pub struct MessagesContainer {
	messages: Mutex<Vec<Message>>,
}

impl MessagesContainer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&self, message: Message) {
		self.messages.lock().push(message);
	}

	/// Remove and return all messages
	pub fn take(&self) -> Vec<Message> {
		std::mem::take(&mut *self.messages.lock())
	}

	pub fn get_messages(&self) -> Vec<Message> {
		self.messages.lock().clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_take_drains_container() {
		let container = MessagesContainer::new();
		container.add(Message::success("3 Products were successfully updated."));
		container.add(Message::warning("careful"));

		let messages = container.take();
		assert_eq!(messages.len(), 2);
		assert_eq!(messages[0].level, Level::Success);
		assert!(container.get_messages().is_empty());
	}

	#[rstest]
	fn test_level_serializes_lowercase() {
		let json = serde_json::to_value(Message::success("ok")).unwrap();
		assert_eq!(json["level"], "success");
	}
}
