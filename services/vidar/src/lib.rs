/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! # Vidar
//!
//! HTTP API for booster purchases, the weekly community pot, ad bookings and shills.

#![allow(opaque_hidden_inferred_bound)]

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod settings;
pub mod state;
