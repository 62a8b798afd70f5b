//! Derive macros for `tfattr`
//!
//! Both derives bind every field of a struct with named fields to an object attribute:
//!
//! ```ignore
//! #[derive(Default, tfattr::FromValue, tfattr::ToValue)]
//! struct Disk {
//!     #[tfattr(name = "size")]
//!     size: u64,
//! }
//! ```
//!
//! Every field needs a name, names must be unique and only contain lowercase letters, digits
//! and underscores. `FromValue` also requires `Default`, it is used for unknown and null objects
//! when the decoding options allow it.
//!
//! For generic structs every field type gets a `FromValue`/`ToValue` bound, and the struct a
//! `Default` bound.
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::spanned::Spanned;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Fields, Generics, LitStr};

/// Implements `tfattr::reflect::FromValue`
#[proc_macro_derive(FromValue, attributes(tfattr))]
pub fn derive_from_value(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_from_value(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Implements `tfattr::reflect::ToValue`
#[proc_macro_derive(ToValue, attributes(tfattr))]
pub fn derive_to_value(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_to_value(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// A struct field and the attribute it is bound to
struct BoundField<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    name: String,
}

/// Adds `bound` for every field type, and `extra` for `Self`, if the struct is generic
fn bounded_generics(
    generics: &Generics,
    fields: &[BoundField],
    bound: TokenStream2,
    extra: Option<TokenStream2>,
) -> Generics {
    let mut generics = generics.clone();
    if generics.params.is_empty() {
        return generics;
    }

    let where_clause = generics.make_where_clause();
    for field in fields {
        let ty = field.ty;
        where_clause.predicates.push(parse_quote!(#ty: #bound));
    }
    if let Some(extra) = extra {
        where_clause.predicates.push(parse_quote!(Self: #extra));
    }
    generics
}

fn expand_from_value(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = bound_fields(input)?;
    let ident = &input.ident;
    let struct_name = ident.to_string();
    let generics = bounded_generics(
        &input.generics,
        &fields,
        quote!(::tfattr::reflect::FromValue),
        Some(quote!(::std::default::Default)),
    );
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let names = fields.iter().map(|field| &field.name);
    let inits = fields.iter().map(|BoundField { ident, name, .. }| {
        quote! { #ident: decoder.field(#name, options)? }
    });

    Ok(quote! {
        impl #impl_generics ::tfattr::reflect::FromValue for #ident #ty_generics #where_clause {
            fn from_value(
                value: &::tfattr::Value,
                options: &::tfattr::reflect::Options,
                path: &::tfattr::AttributePath,
            ) -> ::std::result::Result<Self, ::tfattr::Error> {
                let ::std::option::Option::Some(decoder) = ::tfattr::reflect::StructDecoder::new(
                    value,
                    #struct_name,
                    &[#(#names),*],
                    path,
                )? else {
                    return ::tfattr::reflect::unhandled(value.state(), options, path);
                };

                ::std::result::Result::Ok(Self {
                    #(#inits,)*
                })
            }
        }
    })
}

fn expand_to_value(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = bound_fields(input)?;
    let ident = &input.ident;
    let struct_name = ident.to_string();
    let generics = bounded_generics(
        &input.generics,
        &fields,
        quote!(::tfattr::reflect::ToValue),
        None,
    );
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let names = fields.iter().map(|field| &field.name);
    let encodes = fields.iter().map(|BoundField { ident, name, .. }| {
        quote! { encoder.field(#name, &self.#ident)?; }
    });

    Ok(quote! {
        impl #impl_generics ::tfattr::reflect::ToValue for #ident #ty_generics #where_clause {
            fn to_value(
                &self,
                ty: &::tfattr::Type,
                path: &::tfattr::AttributePath,
            ) -> ::std::result::Result<::tfattr::Value, ::tfattr::Error> {
                let mut encoder = ::tfattr::reflect::StructEncoder::new(
                    ty,
                    #struct_name,
                    &[#(#names),*],
                    path,
                )?;
                #(#encodes)*
                encoder.finish()
            }
        }
    })
}

fn bound_fields(input: &DeriveInput) -> syn::Result<Vec<BoundField<'_>>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "tfattr derives can only be used on structs",
        ));
    };

    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "tfattr derives require a struct with named fields",
        ));
    };

    let mut fields: Vec<BoundField> = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let Some(ident) = &field.ident else {
            continue;
        };

        let name = attribute_name(field, ident)?;
        if fields.iter().any(|bound| bound.name == name.value()) {
            return Err(syn::Error::new(
                name.span(),
                format!("attribute name {:?} is used by more than one field", name.value()),
            ));
        }

        fields.push(BoundField {
            ident,
            ty: &field.ty,
            name: name.value(),
        });
    }

    Ok(fields)
}

/// Reads `#[tfattr(name = "...")]`
fn attribute_name(field: &syn::Field, ident: &syn::Ident) -> syn::Result<LitStr> {
    let mut name: Option<LitStr> = None;

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("tfattr")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                if name.is_some() {
                    return Err(meta.error("duplicate `name`"));
                }
                name = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported tfattr attribute, expected `name`"))
            }
        })?;
    }

    let Some(name) = name else {
        return Err(syn::Error::new(
            ident.span(),
            "missing `#[tfattr(name = \"...\")]`, every field must be bound to an attribute",
        ));
    };

    let valid = !name.value().is_empty()
        && name
            .value()
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid {
        return Err(syn::Error::new(
            name.span(),
            "attribute names may only contain lowercase letters, digits and underscores",
        ));
    }

    Ok(name)
}
