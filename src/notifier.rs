use std::{env, time::Duration};

use eyre::{eyre, WrapErr};
use serde::Serialize;

use crate::model::{PortfolioSummary, SignalLabel};

pub trait Notifier {
    fn notify(&self, message: &str) -> eyre::Result<()>;
}

/// Best-effort delivery. Failures are logged and never returned.
pub fn dispatch(notifier: &dyn Notifier, message: &str) {
    if let Err(e) = notifier.notify(message) {
        log::warn!("notification dropped: {e:#}");
    }
}

/// One message per row whose latest signal is Buy or Sell.
pub fn signal_alerts(summary: &PortfolioSummary) -> Vec<String> {
    summary
        .rows
        .iter()
        .filter_map(|row| match row.signal {
            Some(signal @ (SignalLabel::Buy | SignalLabel::Sell)) => Some(format!(
                "{signal} signal for {} at {:.2} ({:+.2}%)",
                row.ticker, row.latest_price, row.change_pct
            )),
            _ => None,
        })
        .collect()
}

/// Writes messages to the log instead of an external channel.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) -> eyre::Result<()> {
        log::info!("notify: {message}");
        Ok(())
    }
}

pub struct TelegramNotifier {
    client: reqwest::blocking::Client,
    token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> eyre::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Reads `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.
    pub fn from_env() -> eyre::Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN").wrap_err("TELEGRAM_BOT_TOKEN is not set")?;
        let chat_id = env::var("TELEGRAM_CHAT_ID").wrap_err("TELEGRAM_CHAT_ID is not set")?;
        Self::new(token, chat_id)
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, message: &str) -> eyre::Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let response = self
            .client
            .post(url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text: message,
            })
            .send()?;

        if !response.status().is_success() {
            return Err(eyre!("telegram responded with {}", response.status()));
        }
        Ok(())
    }
}
