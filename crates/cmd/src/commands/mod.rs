// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod handle;
pub mod transfer;

pub use handle::handle_command;
pub use transfer::transfer_command;
