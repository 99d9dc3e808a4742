// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Placeholder timing harness for the full registration/authentication
//! round trip, in the shape a `criterion`-based suite would take
//! (`harness = false` in `Cargo.toml`). Not wired to `criterion` itself to
//! keep the default dependency graph minimal; see `DESIGN.md`.

use std::time::Instant;

use opaque_core::ksf::Identity;
use opaque_core::suite::P256Sha256;
use opaque_core::{
    create_registration_response, generate_ke2, server_finish, ClientAuthState,
    ClientRegistrationState, Identifiers, ServerSetup,
};
use rand::rngs::OsRng;

type Suite = P256Sha256<Identity>;

fn time_full_round_trip(iterations: u32) -> std::time::Duration {
    let setup = ServerSetup::<Suite>::new(&mut OsRng, b"opaque-core-bench").unwrap();
    let (client_reg, request) =
        ClientRegistrationState::<Suite>::start(&mut OsRng, b"correct-password").unwrap();
    let response = create_registration_response(&setup, &request, b"bench@example.com").unwrap();
    let (record, _) = client_reg
        .finish(&mut OsRng, &response, Identifiers::default())
        .unwrap();

    let start = Instant::now();
    for _ in 0..iterations {
        let (client_auth, ke1) =
            ClientAuthState::<Suite>::start(&mut OsRng, b"correct-password").unwrap();
        let (ke2, server_state) = generate_ke2(
            &mut OsRng,
            &setup,
            Some(&record),
            b"bench@example.com",
            &ke1,
            Identifiers::default(),
        )
        .unwrap();
        let (ke3, _, _) = client_auth
            .finish(b"opaque-core-bench", &ke2, Identifiers::default())
            .unwrap();
        server_finish(server_state, &ke3.client_mac).unwrap();
    }
    start.elapsed()
}

fn main() {
    const ITERATIONS: u32 = 100;
    let elapsed = time_full_round_trip(ITERATIONS);
    println!(
        "full P256-SHA256/Identity-KSF round trip: {:?} total, {:?}/iteration over {ITERATIONS} iterations",
        elapsed,
        elapsed / ITERATIONS,
    );
}
