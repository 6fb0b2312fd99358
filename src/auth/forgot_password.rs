//! The page explaining how to reset a forgotten password.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{endpoints, html::base};

fn forgot_password_view() -> Markup {
    let content = html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            a href=(endpoints::LOG_IN_VIEW) class="flex items-center mb-6 text-2xl font-semibold"
            {
                "TabunganKu SD"
            }

            div class="w-full bg-white rounded-lg shadow dark:border md:mt-0 sm:max-w-md xl:p-0 dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1 class="text-xl font-bold md:text-2xl"
                    {
                        "Lupa kata sandi?"
                    }

                    p class="text-justify"
                    {
                        "Untuk mengatur ulang kata sandi, buka folder tempat server ini
                        dijalankan lalu jalankan program "
                        code { "reset_password" }
                        " dengan lokasi file database:"
                    }

                    pre class="p-2 overflow-x-auto text-sm bg-gray-100 rounded dark:bg-gray-700"
                    {
                        code { "reset_password --db-path tabunganku.db" }
                    }

                    p
                    {
                        a
                            href=(endpoints::LOG_IN_VIEW)
                            class="font-semibold text-blue-600 hover:text-blue-500 dark:text-blue-500"
                        {
                            "Kembali ke halaman masuk"
                        }
                    }
                }
            }
        }
    };

    base("Lupa Kata Sandi", &content)
}

/// Display instructions for resetting the password from the command line.
pub async fn get_forgot_password_page() -> Response {
    forgot_password_view().into_response()
}
