// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod default_adapter;

pub use db::{SqlxAdapter, SqlxAdapterFactory};
pub use default_adapter::{GlobalDefaultAdapter, NoopRegistrar};
