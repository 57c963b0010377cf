// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Procedural macros for the Tessera store.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, LitStr};

/// Derives `tessera_data::Object` for a struct or enum.
///
/// The registered type name defaults to the type's identifier and can be overridden
/// with `#[object(name = "...")]`. The type must also implement `Default`,
/// `serde::Serialize` and `serde::Deserialize`, which are the supertraits of `Object`.
///
/// ```ignore
/// #[derive(Default, Serialize, Deserialize, Object)]
/// #[object(name = "Widget")]
/// struct WidgetData { size: u32 }
/// ```
#[proc_macro_derive(Object, attributes(object))]
pub fn derive_object(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree.
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut type_name = LitStr::new(&name.to_string(), name.span());
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("object")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                type_name = meta.value()?.parse()?;
                Ok(())
            } else {
                Err(meta.error("unsupported object attribute, expected `name`"))
            }
        });
        if let Err(err) = parsed {
            return err.to_compile_error().into();
        }
    }

    // The path goes through the crate name so the derive works both inside
    // `tessera-data` (which aliases itself) and in downstream crates.
    let expanded = quote! {
        impl #impl_generics ::tessera_data::Object for #name #ty_generics #where_clause {
            const TYPE_NAME: &'static str = #type_name;
        }
    };

    TokenStream::from(expanded)
}
