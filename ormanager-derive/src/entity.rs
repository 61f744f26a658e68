use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Error, Result};

mod entity;
use entity::Entity;

mod field;
use field::Field;

pub fn impl_entity(input: DeriveInput) -> Result<TokenStream> {
    let entity = Entity::read(&input)?;
    let struct_ident = &entity.ident;
    let name = entity.name();

    let mut id_field: Option<Field> = None;
    let mut fields = quote!();

    for result in entity.fields() {
        let field = result?;

        fields.extend(field.as_metadata()?);

        if field.id {
            if id_field.is_some() {
                return Err(field.error("only one #[id] field allowed"));
            }
            id_field = Some(field);
        }
    }

    let Some(id_field) = id_field else {
        return Err(Error::new(
            struct_ident.span(),
            "Entity derive requires an #[id] field",
        ));
    };
    let id_ident = id_field.ident();

    let table = match &entity.table {
        Some(table) => quote!(.table(#table)),
        None => quote!(),
    };

    Ok(quote! {
        impl ::ormanager::Entity for #struct_ident {
            fn metadata() -> ::ormanager::EntityMetadata<Self> {
                ::ormanager::EntityMetadata::new(#name)
                    #table
                    #fields
            }

            fn id(&self) -> ::core::option::Option<::ormanager::Id> {
                ::ormanager::entity::key_of(&self.#id_ident)
            }
        }
    })
}
