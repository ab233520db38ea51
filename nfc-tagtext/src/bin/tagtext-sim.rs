//! Simulator for nfc-tagtext
//!
//! Runs the service against an in-memory tag and prints every outcome as
//! JSON, to check probing and write behaviour without a reader.
//!
//! Usage: tagtext-sim [PROFILE] [TEXT]
//!
//! Profiles:
//!   ntag         every read and write accepted (default)
//!   page5-only   only 4-byte reads of page 5 work
//!   no-extended  16-byte reads and multi-page writes refused
//!   dead         every read refused
//!
//! Set RUST_LOG=debug to see each transport call.

use std::env;
use std::process;
use std::time::Duration;

use serde::Serialize;

use nfc_tagtext::card::{CardIdentity, NTAG_ATR};
use nfc_tagtext::service::{ServiceConfig, TagService};
use nfc_tagtext::transport::{reader_handle, Notification, SimulatedTag};

const READER_NAME: &str = "Simulated Reader 0";
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn profile(name: &str) -> Option<SimulatedTag> {
    let tag = SimulatedTag::ntag213();
    match name {
        "ntag" => Some(tag),
        "page5-only" => Some(tag.allow_only_reads(&[(20, 4)])),
        "no-extended" => Some(tag.reject_read(16, 16).reject_read(16, 64).max_write_len(4)),
        "dead" => Some(tag.allow_only_reads(&[])),
        _ => None,
    }
}

fn print_json<T: Serialize>(label: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("== {}\n{}", label, json),
        Err(e) => eprintln!("Failed to serialize {}: {}", label, e),
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let profile_name = args.get(1).map(String::as_str).unwrap_or("ntag");
    let text = args.get(2).map(String::as_str).unwrap_or("42");

    let tag = match profile(profile_name) {
        Some(tag) => tag,
        None => {
            eprintln!("Unknown profile: {}", profile_name);
            eprintln!("Available: ntag, page5-only, no-extended, dead");
            process::exit(2);
        }
    };

    let service = TagService::new(ServiceConfig::from_env());
    let events = service.subscribe();
    print_json("start", &service.start());

    let notifier = match service.notifier() {
        Some(notifier) => notifier,
        None => {
            eprintln!("Service did not start");
            process::exit(1);
        }
    };

    let notifications = vec![
        Notification::ReaderAttached {
            name: READER_NAME.to_string(),
            handle: reader_handle(tag),
        },
        Notification::CardAttached {
            reader: READER_NAME.to_string(),
            card: CardIdentity::new(
                vec![0x04, 0xA2, 0x3B, 0x1D, 0x12, 0x8C, 0x64],
                Some(NTAG_ATR.to_vec()),
            ),
        },
    ];
    for notification in notifications {
        if let Err(e) = notifier.send(notification) {
            eprintln!("Failed to deliver notification: {}", e);
            process::exit(1);
        }
    }

    match events.recv_timeout(EVENT_TIMEOUT) {
        Ok(event) => print_json("event", &event),
        Err(e) => {
            eprintln!("No card event received: {}", e);
            process::exit(1);
        }
    }
    // An inconclusive probe is followed by an error event
    while let Ok(event) = events.try_recv() {
        print_json("event", &event);
    }

    print_json("status", &service.status());
    print_json("write", &service.write_text(text));
    print_json("read", &service.read_text());
    print_json("card info", &service.get_card_info());
    print_json("stop", &service.stop());
}
