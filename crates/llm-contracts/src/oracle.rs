// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::requests::ProviderRequest;
use crate::responses::ProviderResponse;
use crate::types::LLMResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Opaque text-completion model. Implementations own transport, retries and
/// timeouts; callers only see the returned text.
#[async_trait]
pub trait CompletionOracle: Send + Sync {
    async fn complete(&self, request: ProviderRequest) -> LLMResult<ProviderResponse>;

    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<T: CompletionOracle + ?Sized> CompletionOracle for Arc<T> {
    async fn complete(&self, request: ProviderRequest) -> LLMResult<ProviderResponse> {
        (**self).complete(request).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}
