/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
table! {
    users (id) {
        id -> Int8,
        identity -> Varchar,
        tier -> Varchar,
        total_shills -> Int8,
        daily_shills -> Int8,
        weekly_shills -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    tokens (id) {
        id -> Int8,
        contract_address -> Varchar,
        chain -> Varchar,
        name -> Nullable<Varchar>,
        symbol -> Nullable<Varchar>,
        total_shills -> Int8,
        created_at -> Timestamptz,
    }
}

table! {
    shills (id) {
        id -> Int8,
        user_id -> Int8,
        token_id -> Int8,
        points -> Int8,
        created_at -> Timestamptz,
    }
}

table! {
    booster_packs (id) {
        id -> Int8,
        name -> Varchar,
        price_sol -> Numeric,
        multiplier -> Int4,
        duration_hours -> Int4,
    }
}

table! {
    user_boosters (id) {
        id -> Int8,
        user_id -> Int8,
        booster_pack_id -> Int8,
        multiplier -> Int4,
        transaction_hash -> Varchar,
        payment_method -> Varchar,
        is_active -> Bool,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

table! {
    ad_slots (id) {
        id -> Int8,
        advertiser -> Varchar,
        slot -> Varchar,
        title -> Nullable<Varchar>,
        link_url -> Varchar,
        image_url -> Nullable<Varchar>,
        start_date -> Date,
        end_date -> Date,
        price_sol -> Numeric,
        total_paid_sol -> Nullable<Numeric>,
        transaction_hash -> Varchar,
        is_approved -> Bool,
        created_at -> Timestamptz,
    }
}

table! {
    featured_ads (id) {
        id -> Int8,
        advertiser -> Varchar,
        slot -> Varchar,
        title -> Nullable<Varchar>,
        link_url -> Varchar,
        image_url -> Nullable<Varchar>,
        start_date -> Date,
        end_date -> Date,
        price_sol -> Numeric,
        total_paid_sol -> Nullable<Numeric>,
        transaction_hash -> Varchar,
        is_approved -> Bool,
        created_at -> Timestamptz,
    }
}

table! {
    sol_payments (id) {
        id -> Int8,
        wallet -> Varchar,
        payment_type -> Varchar,
        amount_sol -> Numeric,
        amount_usd -> Nullable<Numeric>,
        transaction_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

table! {
    pot_snapshots (id) {
        id -> Int8,
        pot_sol -> Numeric,
        pot_usd -> Numeric,
        sol_usd_rate -> Numeric,
        weekly_earnings_sol -> Numeric,
        week_start -> Timestamptz,
        week_end -> Timestamptz,
        ranking -> Varchar,
        created_at -> Timestamptz,
    }
}

table! {
    pot_snapshot_winners (id) {
        id -> Int8,
        snapshot_id -> Int8,
        rank -> Int4,
        user_id -> Int8,
        identity -> Varchar,
        shills -> Int8,
        percentage -> Int4,
        prize_sol -> Numeric,
        prize_usd -> Numeric,
    }
}

joinable!(shills -> users (user_id));
joinable!(shills -> tokens (token_id));
joinable!(user_boosters -> users (user_id));
joinable!(user_boosters -> booster_packs (booster_pack_id));
joinable!(pot_snapshot_winners -> pot_snapshots (snapshot_id));

allow_tables_to_appear_in_same_query!(
    users,
    tokens,
    shills,
    booster_packs,
    user_boosters,
    ad_slots,
    featured_ads,
    sol_payments,
    pot_snapshots,
    pot_snapshot_winners,
);
