use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Vendor endpoints for one brand's cloud.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CloudEndpoints {
    pub brand: &'static str,
    pub api_host: &'static str,
    pub auth_host: &'static str,
    pub client_id: &'static str,
}

pub static CLOUDS: Lazy<HashMap<&str, CloudEndpoints>> = Lazy::new(|| {
    HashMap::from([
        (
            "worx",
            CloudEndpoints {
                brand: "Worx",
                api_host: "api.worxlandroid.com",
                auth_host: "id.worx.com",
                client_id: "150da4d2-bb44-433b-9429-3773adc70a2a",
            },
        ),
        (
            "kress",
            CloudEndpoints {
                brand: "Kress",
                api_host: "api.kress-robotik.com",
                auth_host: "id.kress.com",
                client_id: "931d4bc4-3192-405a-be78-98e43486dc59",
            },
        ),
        (
            "landxcape",
            CloudEndpoints {
                brand: "LandXcape",
                api_host: "api.landxcape-robotics.com",
                auth_host: "id.landxcape-robotics.com",
                client_id: "dec998a9-066f-433b-987a-f5fc54d3af7c",
            },
        ),
        (
            "ferrex",
            CloudEndpoints {
                brand: "Ferrex",
                api_host: "api.watermelon.smartmower.cloud",
                auth_host: "id.watermelon.smartmower.cloud",
                client_id: "10078D10-3840-474A-848A-5EED949AB0FC",
            },
        ),
    ])
});
