// Library root
// ------------
// Finds the GitHub accounts a user follows that do not follow back, and
// unfollows a given list of accounts. The binary (`main.rs`) wires these
// modules to the command line and the interactive form.
//
// Module responsibilities:
// - `api`: blocking REST client (paginated listing, unfollow requests).
// - `scrape`: the same listings gathered by rendering profile pages in a
//   browser session.
// - `browser`: the Chromium session used by `scrape`.
// - `follows`: set difference, unfollow batch, and the string-returning
//   functions bound to the form's actions.
// - `error`: error types and the display-safe `ErrorMessage`.
// - `ui`: terminal form flows; delegates everything to `follows`.
pub mod api;
pub mod browser;
pub mod error;
pub mod follows;
pub mod scrape;
pub mod ui;
