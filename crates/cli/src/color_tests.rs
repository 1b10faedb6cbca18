// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn color_flag_false_always_disables() {
    assert!(!should_colorize(false));
}
