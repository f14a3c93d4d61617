// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn exact_path_matches() {
    assert!(is_bypass_path("/api/v1/auth/jwt/create/"));
    assert!(is_bypass_path("/api/v1/auth/users/reset_password/"));
    assert!(is_bypass_path("/api/auth/token/refresh/"));
}

#[test]
fn prefix_matches() {
    assert!(is_bypass_path("/api/v1/auth/users/activation/abc/def/"));
    assert!(is_bypass_path("/api/token/deadbeef/"));
}

#[test]
fn authenticated_paths_do_not_match() {
    assert!(!is_bypass_path("/api/v1/projects/"));
    assert!(!is_bypass_path("/api/v1/organizations/1/projects/"));
    assert!(!is_bypass_path("/api/v1/notifications/"));
    // Close but not a prefix.
    assert!(!is_bypass_path("/api/v1/auth"));
}

#[test]
fn bare_paths_check_directly() {
    assert_eq!(check_url("/api/v1/auth/jwt/refresh/"), BypassMatch::Match);
    assert_eq!(check_url("/api/v1/tasks/"), BypassMatch::NoMatch);
}

#[test]
fn bare_path_query_is_ignored() {
    assert_eq!(check_url("/api/v1/auth/jwt/create/?next=%2Fboards"), BypassMatch::Match);
    assert_eq!(check_url("/api/v1/tasks/?page=2"), BypassMatch::NoMatch);
}

#[test]
fn absolute_urls_match_on_path() {
    assert_eq!(check_url("http://localhost:8000/api/v1/auth/jwt/create/"), BypassMatch::Match);
    assert_eq!(check_url("https://boards.example.com/api/v1/projects/"), BypassMatch::NoMatch);
}

#[test]
fn unparseable_url_is_malformed() {
    assert_eq!(check_url("http://[truncated"), BypassMatch::Malformed);
    assert_eq!(check_url("no-scheme-no-slash"), BypassMatch::Malformed);
}
