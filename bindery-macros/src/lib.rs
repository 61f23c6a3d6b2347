//! Derive macros for bindery.
//!
//! `#[derive(Component)]` implements `bindery::Component` for a struct:
//! every field marked `#[inject]` becomes a dependency slot resolved from
//! the container, every other field is filled with `Default::default()`.
//!
//! ```rust,ignore
//! #[derive(Component)]
//! struct ProductServiceImpl {
//!     #[inject]
//!     reader: Arc<dyn FileReaderService>,
//!     #[inject]
//!     parser: Arc<dyn ProductParser>,
//!     seen: AtomicUsize,
//! }
//! ```
//!
//! Generated code refers to `::bindery`; use `#[component(crate = "path")]`
//! when the facade crate is renamed or not a direct dependency.

use darling::ast::{Data, Style};
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

#[derive(FromDeriveInput)]
#[darling(attributes(component), supports(struct_named, struct_unit))]
struct ComponentInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<(), ComponentField>,
    #[darling(rename = "crate", default)]
    krate: Option<syn::Path>,
}

#[derive(FromField)]
#[darling(forward_attrs(inject))]
struct ComponentField {
    ident: Option<syn::Ident>,
    ty: syn::Type,
    attrs: Vec<syn::Attribute>,
}

impl ComponentField {
    fn is_injected(&self) -> bool {
        !self.attrs.is_empty()
    }
}

#[proc_macro_derive(Component, attributes(component, inject))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ComponentInput::from_derive_input(&input) {
        Ok(component) => expand(component).into(),
        Err(err) => err.write_errors().into(),
    }
}

fn expand(input: ComponentInput) -> TokenStream2 {
    let krate = input
        .krate
        .unwrap_or_else(|| syn::parse_quote!(::bindery));
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Some(fields) = input.data.take_struct() else {
        return syn::Error::new(ident.span(), "Component can only be derived for structs")
            .to_compile_error();
    };

    let mut slots = Vec::new();
    let mut initializers = Vec::new();

    for field in &fields.fields {
        let Some(name) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;

        if field.is_injected() {
            let slot = name.to_string();
            slots.push(quote! {
                #krate::Slot::of::<#ty>(#slot)
            });
            initializers.push(quote! {
                #name: <#ty as #krate::Injectable>::inject(resolver, #slot)?
            });
        } else {
            initializers.push(quote! {
                #name: ::core::default::Default::default()
            });
        }
    }

    let body = if matches!(fields.style, Style::Unit) {
        quote! { Self }
    } else {
        quote! { Self { #(#initializers,)* } }
    };

    quote! {
        impl #impl_generics #krate::Component for #ident #ty_generics #where_clause {
            fn slots() -> ::std::vec::Vec<#krate::Slot> {
                ::std::vec![#(#slots),*]
            }

            #[allow(unused_variables)]
            fn construct(resolver: &dyn #krate::Resolver) -> #krate::Result<Self> {
                ::core::result::Result::Ok(#body)
            }
        }
    }
}
