//! `#[derive(FieldSet)]`: a unit-only enum as a closed set of column names.

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{Data, DeriveInput, Expr, ExprLit, Fields, Lit, Meta, Result, Variant};

/// Same pattern the runtime validator enforces: `[A-Za-z_][A-Za-z0-9_]*`.
fn is_valid_column_name(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Default)]
struct VariantAttrs {
    rename: Option<String>,
    id: bool,
}

/// Parse `#[field(rename = "...", id)]` from a variant's attributes.
fn parse_variant_attrs(variant: &Variant) -> Result<VariantAttrs> {
    let mut attrs = VariantAttrs::default();
    for attr in &variant.attrs {
        if !attr.path().is_ident("field") {
            continue;
        }
        let nested = attr.parse_args_with(
            syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated,
        )?;
        for meta in &nested {
            match meta {
                Meta::Path(path) if path.is_ident("id") => attrs.id = true,
                Meta::NameValue(nv) if nv.path.is_ident("rename") => match &nv.value {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(s), ..
                    }) => attrs.rename = Some(s.value()),
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "expected #[field(rename = \"column_name\")]",
                        ));
                    }
                },
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "unknown field attribute (expected `rename = \"...\"` or `id`)",
                    ));
                }
            }
        }
    }
    Ok(attrs)
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    let variants = match &input.data {
        Data::Enum(e) => &e.variants,
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "FieldSet can only be derived for enums",
            ));
        }
    };
    if variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "FieldSet requires at least one variant",
        ));
    }

    let mut name_arms = Vec::new();
    let mut members = Vec::new();
    let mut seen: HashMap<String, &syn::Ident> = HashMap::new();
    let mut primary_key: Option<&syn::Ident> = None;

    for variant in variants {
        if !matches!(&variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "FieldSet variants must be unit variants (no fields)",
            ));
        }

        let variant_ident = &variant.ident;
        let attrs = parse_variant_attrs(variant)?;
        let column = attrs
            .rename
            .unwrap_or_else(|| variant_ident.to_string().to_snake_case());

        if !is_valid_column_name(&column) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("invalid column name '{column}' (expected [A-Za-z_][A-Za-z0-9_]*)"),
            ));
        }
        if let Some(previous) = seen.insert(column.clone(), variant_ident) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("duplicate column name '{column}' (also used by `{previous}`)"),
            ));
        }
        if attrs.id {
            if primary_key.is_some() {
                return Err(syn::Error::new_spanned(
                    variant,
                    "only one variant may be marked #[field(id)]",
                ));
            }
            primary_key = Some(variant_ident);
        }

        name_arms.push(quote! {
            #name::#variant_ident => #column,
        });
        members.push(quote! { #name::#variant_ident });
    }

    // Without an explicit #[field(id)] the trait default (a column named `id`) applies.
    let primary_key_fn = primary_key.map(|ident| {
        quote! {
            fn primary_key() -> ::std::option::Option<Self> {
                ::std::option::Option::Some(#name::#ident)
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::dynsql::FieldSet for #name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms)*
                }
            }

            fn all() -> &'static [Self] {
                &[#(#members),*]
            }

            #primary_key_fn
        }
    })
}
