//! # Competition Watch
//!
//! A chat agent that keeps an eye on Product Hunt, Hacker News, service status
//! pages and trademark filings by driving a hosted browser automation service.
//!
//! This library provides:
//! - A tool registry whose tools are scripted browser sessions
//! - A bounded "tools in a loop" agent over an OpenAI-compatible model
//! - An HTTP API and a terminal chat for talking to the agent
//!
//! ## Architecture
//!
//! 1. The shell appends the user's message to the session's conversation
//! 2. The agent asks the model for the next step, offering every tool
//! 3. Requested tool calls run concurrently; results are appended in call order
//! 4. Repeat until the model answers, or fail once the round bound is hit
//!
//! ## Example
//!
//! ```rust,ignore
//! use competition_watch::{agent::Agent, config::Config, conversation::Conversation};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::from_config(&config)?;
//! let mut conversation = Conversation::new();
//! let reply = agent.submit(&mut conversation, "Summarize today's top posts").await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod tools;

pub use config::Config;
