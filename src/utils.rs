use rand::Rng;
use reqwest::Client;
use std::time::Duration;

pub fn build_http_client(user_agent: &str, timeout_secs: u64) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Random `#RRGGBB` fill used to tint the markers of one filter pass.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("#{:06X}", rng.gen_range(0..=0xFF_FFFFu32))
}
