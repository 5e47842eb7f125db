use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta};

/// Derive a struct-of-vectors companion for a per-timestep flux record.
///
/// Every field of the annotated struct must be `f64`. The macro emits
/// `{StructName}Timeseries` (or the name given with
/// `#[fluxes(timeseries_name = "...")]`) holding one `Vec<f64>` per field,
/// with `with_capacity`, `push`, `len`, `is_empty` and `column`.
///
/// On the record itself it adds `field_names()` and `values()`, the latter
/// returning the field values in declaration order so gridded drivers can
/// scatter a record into column-major output buffers.
#[proc_macro_derive(Fluxes, attributes(fluxes))]
pub fn derive_fluxes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    let ts_name = extract_timeseries_name(&input)
        .unwrap_or_else(|| format_ident!("{}Timeseries", name));

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return syn::Error::new_spanned(
                    name,
                    "Fluxes can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "Fluxes can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    if fields.is_empty() {
        return syn::Error::new_spanned(name, "Fluxes struct must have at least one field")
            .to_compile_error()
            .into();
    }

    let mut field_names = Vec::with_capacity(fields.len());
    let mut field_idents = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if !is_f64_type(&field.ty) {
            return syn::Error::new_spanned(&field.ty, "Fluxes derive: all fields must be f64")
                .to_compile_error()
                .into();
        }
        field_names.push(ident.to_string());
        field_idents.push(ident);
    }

    let n_fields = field_idents.len();
    let first_field = &field_idents[0];
    let field_name_strs: Vec<&str> = field_names.iter().map(|s| s.as_str()).collect();

    let ts_fields = field_idents.iter().map(|f| quote! { pub #f: Vec<f64> });
    let with_cap_fields = field_idents
        .iter()
        .map(|f| quote! { #f: Vec::with_capacity(n) });
    let push_fields = field_idents.iter().map(|f| quote! { self.#f.push(f.#f); });
    let column_arms = field_idents
        .iter()
        .zip(&field_name_strs)
        .map(|(f, s)| quote! { #s => Some(self.#f.as_slice()), });

    let expanded = quote! {
        /// Per-field vectors collected over a run, one entry per timestep.
        #[derive(Debug, Clone, Default)]
        pub struct #ts_name {
            #(#ts_fields,)*
        }

        impl #ts_name {
            /// Pre-allocate all vectors for `n` timesteps.
            pub fn with_capacity(n: usize) -> Self {
                Self {
                    #(#with_cap_fields,)*
                }
            }

            /// Append one timestep.
            pub fn push(&mut self, f: &#name) {
                #(#push_fields)*
            }

            /// Number of timesteps stored.
            pub fn len(&self) -> usize {
                self.#first_field.len()
            }

            /// Returns `true` if no timesteps have been stored.
            pub fn is_empty(&self) -> bool {
                self.#first_field.is_empty()
            }

            /// Look up a column by field name.
            pub fn column(&self, name: &str) -> Option<&[f64]> {
                match name {
                    #(#column_arms)*
                    _ => None,
                }
            }
        }

        impl #name {
            /// Number of fields in the record.
            pub const N_FIELDS: usize = #n_fields;

            /// Field names in declaration order.
            pub fn field_names() -> &'static [&'static str] {
                &[#(#field_name_strs),*]
            }

            /// Field values in declaration order.
            pub fn values(&self) -> [f64; #n_fields] {
                [#(self.#field_idents),*]
            }
        }
    };

    expanded.into()
}

fn extract_timeseries_name(input: &DeriveInput) -> Option<proc_macro2::Ident> {
    for attr in &input.attrs {
        if !attr.path().is_ident("fluxes") {
            continue;
        }
        let nested = attr
            .parse_args_with(
                syn::punctuated::Punctuated::<syn::Meta, syn::Token![,]>::parse_terminated,
            )
            .ok()?;
        for meta in nested {
            let Meta::NameValue(nv) = meta else {
                continue;
            };
            if !nv.path.is_ident("timeseries_name") {
                continue;
            }
            if let syn::Expr::Lit(expr_lit) = &nv.value {
                if let Lit::Str(lit_str) = &expr_lit.lit {
                    return Some(format_ident!("{}", lit_str.value()));
                }
            }
        }
    }
    None
}

fn is_f64_type(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(type_path) => type_path.path.is_ident("f64"),
        _ => false,
    }
}
