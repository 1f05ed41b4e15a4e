//! Derive macro for oxide-mapper entity metadata.
//!
//! This crate provides `#[derive(Entity)]`, which describes a struct to the
//! mapper: its properties, keys, column overrides and navigations.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Fields, GenericArgument, Ident, LitStr, Meta,
    PathArguments, Type,
};

/// Derives `oxide_mapper::Entity` for a struct with named fields.
///
/// # Attributes
///
/// - `#[table(name = "products")]` - Maps to an explicit table (optional,
///   defaults to the pluralized struct name)
/// - `#[table(schema = "dbo")]` - Qualifies the table with a schema
/// - `#[table(interface)]` - Strips a leading `I` from the conventional name
///
/// # Field Attributes
///
/// - `#[column(key)]` - Marks the field as (part of) the key
/// - `#[column(generated)]` - The database assigns the value
/// - `#[column(ignore)]` - Not mapped to any column
/// - `#[column(readonly)]` - Read back but never written
/// - `#[column(name = "column_name")]` - Overrides the column name
/// - `#[column(navigation)]` - A related entity (`T`, `Option<T>`,
///   `Box<T>`) or collection (`Vec<T>`), never a column
/// - `#[column(foreign_key = "CustomerId")]` - Names the property holding
///   this navigation's key
///
/// # Generated Items
///
/// For a struct `Product`, this macro generates:
///
/// - `ProductFields` - One `Prop` handle per mapped field, the parameter of
///   predicate closures
/// - `impl oxide_mapper::Entity for Product` backed by static metadata
#[proc_macro_derive(Entity, attributes(table, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let vis = &input.vis;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity derive only supports structs",
            ));
        }
    };

    let table = parse_table_attrs(&input.attrs)?;

    let mut properties = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        let ty = field.ty.clone();
        let property_type = if attrs.navigation {
            navigation_type(&ty).ok_or_else(|| {
                syn::Error::new_spanned(&ty, "navigation fields must name an entity type")
            })?
        } else {
            scalar_type(&ty)
        };
        properties.push(PropertyInfo {
            name: ident.unraw().to_string(),
            nullable: option_inner(&ty).is_some(),
            ident,
            ty,
            property_type,
            attrs,
        });
    }

    let entity_name = struct_name.unraw().to_string();
    let fields_name = format_ident!("{}Fields", struct_name);
    let property_count = properties.len();

    let property_metas: Vec<TokenStream2> = properties.iter().map(property_meta).collect();

    let table_call = match (&table.name, &table.schema) {
        (Some(name), schema) => {
            let schema = option_tokens(schema.as_ref());
            quote! { .table(#name, #schema) }
        }
        (None, Some(schema)) => {
            let name = &entity_name;
            quote! { .table(#name, Some(#schema)) }
        }
        (None, None) => quote! {},
    };
    let interface_call = if table.interface {
        quote! { .interface() }
    } else {
        quote! {}
    };

    // Predicates only see properties that map to a column.
    let handles: Vec<&PropertyInfo> = properties
        .iter()
        .filter(|p| !p.attrs.navigation && !p.attrs.ignore)
        .collect();
    let handle_fields: Vec<TokenStream2> = handles
        .iter()
        .map(|p| {
            let ident = &p.ident;
            let ty = &p.ty;
            quote! { pub #ident: ::oxide_mapper::Prop<#struct_name, #ty> }
        })
        .collect();
    let handle_values: Vec<TokenStream2> = handles
        .iter()
        .map(|p| {
            let ident = &p.ident;
            let name = &p.name;
            let property_type = &p.property_type;
            quote! { #ident: ::oxide_mapper::Prop::new(#name, #property_type) }
        })
        .collect();

    let fields_doc = format!("Property handles for predicates over `{entity_name}`.");

    let expanded = quote! {
        #[doc = #fields_doc]
        #[derive(Debug, Clone, Copy)]
        #vis struct #fields_name {
            #(#handle_fields),*
        }

        impl ::oxide_mapper::Entity for #struct_name {
            type Fields = #fields_name;

            fn meta() -> &'static ::oxide_mapper::EntityMeta {
                static PROPERTIES: [::oxide_mapper::PropertyMeta; #property_count] = [
                    #(#property_metas),*
                ];
                static META: ::oxide_mapper::EntityMeta = ::oxide_mapper::EntityMeta::new(
                    #entity_name,
                    concat!(module_path!(), "::", #entity_name),
                    &PROPERTIES,
                )
                #table_call
                #interface_call;
                &META
            }

            fn fields() -> &'static #fields_name {
                static FIELDS: #fields_name = #fields_name {
                    #(#handle_values),*
                };
                &FIELDS
            }
        }
    };

    Ok(expanded)
}

struct PropertyInfo {
    ident: Ident,
    name: String,
    ty: Type,
    property_type: TokenStream2,
    nullable: bool,
    attrs: ColumnAttrs,
}

#[derive(Default)]
struct TableAttrs {
    name: Option<String>,
    schema: Option<String>,
    interface: bool,
}

#[derive(Default)]
struct ColumnAttrs {
    key: bool,
    generated: bool,
    ignore: bool,
    readonly: bool,
    navigation: bool,
    name: Option<String>,
    foreign_key: Option<String>,
}

fn property_meta(info: &PropertyInfo) -> TokenStream2 {
    let name = &info.name;
    let property_type = &info.property_type;
    let mut meta = quote! { ::oxide_mapper::PropertyMeta::new(#name, #property_type) };
    let attrs = &info.attrs;
    if attrs.key {
        meta = quote! { #meta.key() };
    }
    if attrs.generated {
        meta = quote! { #meta.generated() };
    }
    if attrs.ignore {
        meta = quote! { #meta.ignore() };
    }
    if attrs.readonly {
        meta = quote! { #meta.readonly() };
    }
    if info.nullable {
        meta = quote! { #meta.nullable() };
    }
    if let Some(column) = &attrs.name {
        meta = quote! { #meta.column(#column) };
    }
    if let Some(foreign_key) = &attrs.foreign_key {
        meta = quote! { #meta.foreign_key(#foreign_key) };
    }
    meta
}

fn option_tokens(value: Option<&String>) -> TokenStream2 {
    match value {
        Some(value) => quote! { Some(#value) },
        None => quote! { None },
    }
}

fn parse_table_attrs(attrs: &[Attribute]) -> syn::Result<TableAttrs> {
    let mut result = TableAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("table") || matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                result.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("schema") {
                result.schema = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("interface") {
                result.interface = true;
            } else {
                return Err(meta.error("unknown table attribute"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();
    for attr in attrs {
        // Handle empty attribute like #[column]
        if !attr.path().is_ident("column") || matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                result.key = true;
            } else if meta.path.is_ident("generated") {
                result.generated = true;
            } else if meta.path.is_ident("ignore") {
                result.ignore = true;
            } else if meta.path.is_ident("readonly") {
                result.readonly = true;
            } else if meta.path.is_ident("navigation") {
                result.navigation = true;
            } else if meta.path.is_ident("name") {
                result.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("foreign_key") {
                result.foreign_key = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("unknown column attribute"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

/// Returns the last path segment of a type, with its generic arguments.
fn last_segment(ty: &Type) -> Option<(&Ident, Vec<&Type>)> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    let arguments = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Some((&segment.ident, arguments))
}

/// Returns `T` for `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    match last_segment(ty)? {
        (ident, args) if ident == "Option" && args.len() == 1 => Some(args[0]),
        _ => None,
    }
}

/// Maps a field type to its `PropertyType`, looking through `Option`.
fn scalar_type(ty: &Type) -> TokenStream2 {
    let ty = option_inner(ty).unwrap_or(ty);
    let kind = match last_segment(ty) {
        Some((ident, args)) => match ident.to_string().as_str() {
            "bool" => "Bool",
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize" => "Int",
            "f32" | "f64" => "Float",
            "String" | "str" | "char" => "Text",
            "NaiveDate" | "NaiveDateTime" | "NaiveTime" | "DateTime" => "DateTime",
            "Vec" if args.first().and_then(|t| last_segment(t)).is_some_and(|(i, _)| i == "u8") => {
                "Bytes"
            }
            _ => "Other",
        },
        None => "Other",
    };
    let kind = format_ident!("{}", kind);
    quote! { ::oxide_mapper::PropertyType::#kind }
}

/// Maps a navigation field to `Entity("T")` or `Collection("T")`.
fn navigation_type(ty: &Type) -> Option<TokenStream2> {
    let mut ty = option_inner(ty).unwrap_or(ty);
    loop {
        let (ident, args) = last_segment(ty)?;
        match (ident.to_string().as_str(), args.as_slice()) {
            ("Box" | "Arc" | "Rc", [inner]) => ty = *inner,
            ("Vec", [inner]) => {
                let (related, _) = last_segment(inner)?;
                let related = related.unraw().to_string();
                return Some(quote! { ::oxide_mapper::PropertyType::Collection(#related) });
            }
            _ => {
                let related = ident.unraw().to_string();
                return Some(quote! { ::oxide_mapper::PropertyType::Entity(#related) });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn render(tokens: TokenStream2) -> String {
        tokens.to_string().replace(' ', "")
    }

    #[test]
    fn test_scalar_types() {
        assert_eq!(render(scalar_type(&parse_quote!(i64))), "::oxide_mapper::PropertyType::Int");
        assert_eq!(
            render(scalar_type(&parse_quote!(Option<String>))),
            "::oxide_mapper::PropertyType::Text"
        );
        assert_eq!(
            render(scalar_type(&parse_quote!(Vec<u8>))),
            "::oxide_mapper::PropertyType::Bytes"
        );
        assert_eq!(
            render(scalar_type(&parse_quote!(chrono::NaiveDateTime))),
            "::oxide_mapper::PropertyType::DateTime"
        );
        assert_eq!(
            render(scalar_type(&parse_quote!(uuid::Uuid))),
            "::oxide_mapper::PropertyType::Other"
        );
    }

    #[test]
    fn test_navigation_types() {
        let single = navigation_type(&parse_quote!(Option<Box<Customer>>)).unwrap();
        assert_eq!(render(single), "::oxide_mapper::PropertyType::Entity(\"Customer\")");
        let many = navigation_type(&parse_quote!(Vec<OrderLine>)).unwrap();
        assert_eq!(render(many), "::oxide_mapper::PropertyType::Collection(\"OrderLine\")");
    }

    #[test]
    fn test_column_attrs() {
        let field: syn::Field = parse_quote! {
            #[column(key, generated, name = "product_id")]
            id: i64
        };
        let attrs = parse_column_attrs(&field.attrs).unwrap();
        assert!(attrs.key);
        assert!(attrs.generated);
        assert_eq!(attrs.name.as_deref(), Some("product_id"));
    }

    #[test]
    fn test_unknown_column_attr_is_rejected() {
        let field: syn::Field = parse_quote! {
            #[column(primary_key)]
            id: i64
        };
        assert!(parse_column_attrs(&field.attrs).is_err());
    }

    #[test]
    fn test_generic_struct_is_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Wrapper<T> { value: T }
        };
        assert!(derive_entity_impl(input).is_err());
    }
}
