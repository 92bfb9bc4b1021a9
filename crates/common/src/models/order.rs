/// One order submission to the brokerage. Built per trigger event and handed
/// to the brokerage client exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub trading_symbol: String,
    pub exchange: Exchange,
    pub transaction_type: TransactionType,
    pub quantity: u32,
    pub order_type: OrderType,
    pub product: Product,
    pub validity: Validity,
}

impl OrderRequest {
    /// Delivery market buy, IOC validity. Kite fills market orders against
    /// NSE by default, so that is the exchange used here.
    pub fn market_buy(trading_symbol: &str, quantity: u32) -> Self {
        Self {
            trading_symbol: trading_symbol.trim().to_uppercase(),
            exchange: Exchange::Nse,
            transaction_type: TransactionType::Buy,
            quantity,
            order_type: OrderType::Market,
            product: Product::Cnc,
            validity: Validity::Ioc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Nse,
    Bse,
}

impl Exchange {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nse => "NSE",
            Self::Bse => "BSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    /// Cash and carry (delivery).
    Cnc,
    /// Intraday.
    Mis,
}

impl Product {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cnc => "CNC",
            Self::Mis => "MIS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Day,
    Ioc,
}

impl Validity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "DAY",
            Self::Ioc => "IOC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_buy_uses_delivery_ioc_defaults() {
        let order = OrderRequest::market_buy(" abc ", 30);
        assert_eq!(order.trading_symbol, "ABC");
        assert_eq!(order.transaction_type.as_str(), "BUY");
        assert_eq!(order.order_type.as_str(), "MARKET");
        assert_eq!(order.product.as_str(), "CNC");
        assert_eq!(order.validity.as_str(), "IOC");
        assert_eq!(order.exchange.as_str(), "NSE");
    }
}
