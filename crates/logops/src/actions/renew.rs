//! `renew`: certificate renewal.

use tracing::info;

use super::capture;
use crate::settings::Settings;
use crate::sink::ErrorSink;

pub fn run(settings: &Settings, sink: &dyn ErrorSink) {
    info!(command = ?settings.renew_command, "renewing certificates");
    match capture(&settings.renew_command, None) {
        Ok(out) if out.success => println!("{}", out.stdout),
        Ok(out) => sink.record(&out.stderr),
        Err(err) => sink.record(&format!("{:?}", err)),
    }
}
