// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - application flows behind the screens.

pub mod account;
pub mod favorite;
pub mod post;
pub mod user;

pub use account::AccountService;
pub use favorite::FavoriteService;
pub use post::PostService;
pub use user::UserService;
