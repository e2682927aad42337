//! Test Helpers

use crate::{
    domain::products::{
        ProductsService, ProductsServiceError,
        models::{NewProduct, Product, ProductUuid},
    },
    test::TestContext,
};

pub(crate) async fn create_product(
    ctx: &TestContext,
    price: u64,
    stock_quantity: u32,
) -> Result<Product, ProductsServiceError> {
    ctx.products
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            name: "Teapot".to_string(),
            price,
            stock_quantity,
        })
        .await
}

pub(crate) async fn stock_of(
    ctx: &TestContext,
    product: ProductUuid,
) -> Result<u32, ProductsServiceError> {
    Ok(ctx.products.get_product(product).await?.stock_quantity)
}
