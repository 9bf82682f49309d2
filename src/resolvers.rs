//! Field resolvers for the Wish API.
//!
//! Root resolvers call the [`WishBackend`](crate::wish_client::WishBackend)
//! once and hand the fetched [`Wish`] values down as parent values. Scalar
//! resolvers on `Wish` only project fields from that parent, so selecting more
//! sub-fields never costs another backend call.

use crate::config::Environment;
use crate::types::Wish;
use crate::wish_client::SharedWishBackend;
use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use async_graphql::Value;

/// Signature shared by every bound resolver
pub type ResolverFn = for<'a> fn(ResolverContext<'a>) -> FieldFuture<'a>;

/// `Query.allWish: [Wish!]!`
///
/// The field is non-null, so a backend failure propagates and nulls `data`.
pub fn all_wish(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let backend = ctx.data::<SharedWishBackend>()?;
        let environment = *ctx.data::<Environment>()?;

        let wishes = backend
            .list_wishes()
            .await
            .map_err(|e| e.to_graphql_error(environment))?;

        Ok(Some(FieldValue::list(
            wishes.into_iter().map(FieldValue::owned_any),
        )))
    })
}

/// `Query.wish(id: ID!): Wish`
///
/// An unknown id resolves to `null` without an error entry. A backend failure
/// is recorded against this field and the field resolves to `null`, leaving
/// sibling fields untouched.
pub fn wish(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let id = id_argument(&ctx)?;
        let backend = ctx.data::<SharedWishBackend>()?;
        let environment = *ctx.data::<Environment>()?;

        match backend.get_wish(&id).await {
            Ok(wish) => Ok(wish.map(FieldValue::owned_any)),
            Err(e) => {
                let error = e.to_graphql_error(environment).into_server_error(ctx.item.pos);
                ctx.add_error(ctx.set_error_path(error));
                Ok(None)
            }
        }
    })
}

/// `Wish.id: ID!`
pub fn wish_id(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let wish = ctx.parent_value.try_downcast_ref::<Wish>()?;
        Ok(Some(FieldValue::value(wish.id.clone())))
    })
}

/// `Wish.description: String`
pub fn wish_description(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let wish = ctx.parent_value.try_downcast_ref::<Wish>()?;
        Ok(Some(FieldValue::value(wish.description.clone())))
    })
}

/// `ID` accepts both string and integer input
fn id_argument(ctx: &ResolverContext<'_>) -> async_graphql::Result<String> {
    match ctx.args.try_get("id")?.as_value() {
        Value::String(id) => Ok(id.clone()),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(async_graphql::Error::new(format!(
            "invalid value for argument \"id\": {other}"
        ))),
    }
}
