use crate::http::EndpointTemplate;

pub const BASE_URI: &str = "https://fakestoreapi.com";

pub const PRODUCTS: EndpointTemplate = EndpointTemplate::new("/products");
pub const PRODUCT_BY_ID: EndpointTemplate = EndpointTemplate::new("/products/{id}");

pub const CARTS: EndpointTemplate = EndpointTemplate::new("/carts");
pub const CART_BY_ID: EndpointTemplate = EndpointTemplate::new("/carts/{id}");
pub const CARTS_BY_USER: EndpointTemplate = EndpointTemplate::new("/carts/user/{userId}");

pub const LOGIN: EndpointTemplate = EndpointTemplate::new("/auth/login");
