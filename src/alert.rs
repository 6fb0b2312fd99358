//! Error alerts that htmx swaps into the page's alert container.

use maud::{Markup, html};

/// An error message with a short explanation of what the user can do about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub message: String,
    pub details: String,
}

impl Alert {
    pub fn into_html(self) -> Markup {
        html! {
            div
                role="alert"
                class="flex items-start justify-between p-4 mb-4 text-sm
                    text-red-800 rounded-lg bg-red-50 dark:bg-gray-800
                    dark:text-red-400 shadow"
            {
                div
                {
                    span class="font-semibold" { (self.message) }

                    @if !self.details.is_empty()
                    {
                        p class="mt-1" { (self.details) }
                    }
                }

                button
                    type="button"
                    aria-label="Tutup"
                    class="ms-4 font-bold"
                    onclick="this.parentElement.remove()"
                {
                    "×"
                }
            }
        }
    }
}
