diesel::table! {
    hives (hive_id) {
        hive_id -> BigInt,
        weight_kg -> Double,
        level -> Integer,
        extracting -> Bool,
        last_update -> Timestamp,
    }
}
