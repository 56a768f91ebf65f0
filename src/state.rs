// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::distribution::Session;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(session),
        }
    }
}
