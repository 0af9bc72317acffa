pub mod client;

pub use client::MeetupClient;
